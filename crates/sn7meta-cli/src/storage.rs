use crate::cli::{IngestArgs, OrphanKeys, StorageBackend};
use anyhow::{Context, Result};
use sn7meta_store::postgres::{ConnectionTarget, PostgresConfig};
use sn7meta_store::{MemoryStarSchemaStore, OrphanKeyPolicy, PostgresStarSchemaStore, StarSchemaStore};
use std::sync::Arc;

impl From<OrphanKeys> for OrphanKeyPolicy {
    fn from(keys: OrphanKeys) -> Self {
        match keys {
            OrphanKeys::Nullify => OrphanKeyPolicy::Nullify,
            OrphanKeys::Reject => OrphanKeyPolicy::Reject,
        }
    }
}

/// Open the selected star-schema store
pub async fn open_store(args: &IngestArgs) -> Result<Arc<dyn StarSchemaStore>> {
    match args.storage {
        StorageBackend::Memory => Ok(Arc::new(MemoryStarSchemaStore::with_orphan_policy(args.orphan_keys.into()))),
        StorageBackend::Postgres => {
            let store = open_postgres(postgres_config(args)?).await?;
            Ok(Arc::new(store))
        }
    }
}

/// `--database-url`, then `--host` and friends, then DATABASE_URL
pub fn postgres_config(args: &IngestArgs) -> Result<PostgresConfig> {
    let config = match (&args.database_url, &args.host) {
        (Some(url), _) => PostgresConfig::new(url.clone()).context("Invalid --database-url")?,
        (None, Some(host)) => PostgresConfig::from_parts(
            host.clone(),
            args.port,
            args.user.clone(),
            args.password.clone(),
            args.dbname.clone(),
        )
        .context("Invalid PostgreSQL connection parameters")?,
        (None, None) => PostgresConfig::from_env().context(
            "No PostgreSQL connection given. Pass --database-url, --host, or set DATABASE_URL.",
        )?,
    };
    Ok(config.with_orphan_key_policy(args.orphan_keys.into()))
}

async fn open_postgres(config: PostgresConfig) -> Result<PostgresStarSchemaStore> {
    let target = describe_target(&config.target);
    PostgresStarSchemaStore::with_migrations(config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to PostgreSQL\n\n\
                Connection: {}\n\n\
                Remediation:\n\
                  1. Ensure PostgreSQL is running with the PostGIS extension available\n\
                  2. Verify the connection parameters or DATABASE_URL\n\
                  3. Verify credentials and that the database exists\n\n\
                Error: {}",
            target,
            e
        )
    })
}

fn describe_target(target: &ConnectionTarget) -> String {
    match target {
        ConnectionTarget::Url(_) => "database URL".to_string(),
        ConnectionTarget::Parts { host, port, user, dbname, .. } => {
            format!("{}@{}:{}/{}", user, host, port, dbname)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn ingest_args(extra: &[&str]) -> IngestArgs {
        let mut argv = vec!["sn7meta", "ingest"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Ingest(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_postgres_config_from_parts() {
        let args = ingest_args(&["--host", "db.internal", "--dbname", "sn7", "--orphan-keys", "reject"]);
        let config = postgres_config(&args).unwrap();

        assert_eq!(config.orphan_key_policy, OrphanKeyPolicy::Reject);
        assert_eq!(describe_target(&config.target), "postgres@db.internal:5432/sn7");
    }

    #[test]
    fn test_postgres_config_from_url() {
        let args = ingest_args(&["--database-url", "postgresql://sn7:pw@localhost/sn7"]);
        let config = postgres_config(&args).unwrap();
        assert!(matches!(config.target, ConnectionTarget::Url(_)));
        assert_eq!(config.orphan_key_policy, OrphanKeyPolicy::Nullify);
    }
}
