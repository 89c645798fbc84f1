//! Migration runner that drives the goose binary as a subprocess.
//!
//! Schema migrations live as SQL files under `migrations/` and are applied
//! by goose, so the same files work from developer machines, CI, and the
//! service binaries at startup.

use anyhow::{Result, bail};
use tokio::process::Command;
use tracing::debug;

/// Runs goose migrations against a database identified by driver and DSN.
pub struct MigrationRunner {
    goose_binary_path: String,
    migrations_dir: String,
    driver: String,
    dsn: String,
}

impl MigrationRunner {
    /// Creates a new MigrationRunner
    ///
    /// # Arguments
    /// * `goose_binary_path` - Path to goose binary (e.g., "goose" or "/usr/local/bin/goose")
    /// * `migrations_dir` - Directory containing migration SQL files
    /// * `driver` - Database driver name (e.g., "postgres")
    /// * `dsn` - Database connection string in driver-specific format
    pub fn new(
        goose_binary_path: String,
        migrations_dir: String,
        driver: String,
        dsn: String,
    ) -> Self {
        Self {
            goose_binary_path,
            migrations_dir,
            driver,
            dsn,
        }
    }

    /// Runs all pending migrations (`goose ... up`)
    pub async fn run_migrations(&self) -> Result<()> {
        debug!("running migrations from directory: {}", self.migrations_dir);
        let stdout = self.goose(&["up"]).await?;
        debug!("migrations completed successfully:\n{}", stdout);
        Ok(())
    }

    /// Rolls back the most recent migration (`goose ... down`)
    pub async fn rollback_migration(&self) -> Result<()> {
        debug!("rolling back most recent migration");
        let stdout = self.goose(&["down"]).await?;
        debug!("rollback completed successfully:\n{}", stdout);
        Ok(())
    }

    /// Gets the current migration status (`goose ... status`)
    pub async fn migration_status(&self) -> Result<String> {
        self.goose(&["status"]).await
    }

    async fn goose(&self, command: &[&str]) -> Result<String> {
        let output = Command::new(&self.goose_binary_path)
            .arg("-dir")
            .arg(&self.migrations_dir)
            .arg(&self.driver)
            .arg(&self.dsn)
            .args(command)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            bail!(
                "goose {} failed.\nstdout: {}\nstderr: {}",
                command.join(" "),
                stdout,
                stderr
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_runner_creation() {
        let runner = MigrationRunner::new(
            "goose".to_string(),
            "migrations/postgres".to_string(),
            "postgres".to_string(),
            "postgres://localhost/quoria".to_string(),
        );

        assert_eq!(runner.goose_binary_path, "goose");
        assert_eq!(runner.driver, "postgres");
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let runner = MigrationRunner::new(
            "/nonexistent/goose".to_string(),
            "migrations/postgres".to_string(),
            "postgres".to_string(),
            "postgres://localhost/quoria".to_string(),
        );

        assert!(runner.run_migrations().await.is_err());
    }
}
