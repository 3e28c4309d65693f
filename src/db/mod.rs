use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{admins, comments, reports};

pub mod migrator;
pub mod repositories;

pub use repositories::report::{
    CommentPage, CommentWithLikes, LikeState, NewReport, ReportOverview,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn report_repo(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    pub async fn create_report(&self, input: NewReport) -> Result<reports::Model> {
        self.report_repo().create(input).await
    }

    pub async fn get_report(&self, id: i32) -> Result<Option<reports::Model>> {
        self.report_repo().get(id).await
    }

    pub async fn list_reports(&self) -> Result<Vec<ReportOverview>> {
        self.report_repo().list().await
    }

    pub async fn get_report_overview(&self, id: i32) -> Result<Option<ReportOverview>> {
        self.report_repo().overview(id).await
    }

    pub async fn list_unanalyzed_reports(&self) -> Result<Vec<reports::Model>> {
        self.report_repo().list_unanalyzed().await
    }

    pub async fn attach_analysis(
        &self,
        id: i32,
        analysis: &str,
        safety_score: &str,
        safety_percentage: i32,
    ) -> Result<Option<reports::Model>> {
        self.report_repo()
            .attach_analysis(id, analysis, safety_score, safety_percentage)
            .await
    }

    pub async fn toggle_report_like(
        &self,
        report_id: i32,
        user_identifier: &str,
    ) -> Result<Option<LikeState>> {
        self.report_repo()
            .toggle_like(report_id, user_identifier)
            .await
    }

    pub async fn add_comment(
        &self,
        report_id: i32,
        user_name: &str,
        user_area: Option<&str>,
        body: &str,
    ) -> Result<Option<comments::Model>> {
        self.report_repo()
            .add_comment(report_id, user_name, user_area, body)
            .await
    }

    pub async fn toggle_comment_like(
        &self,
        report_id: i32,
        comment_public_id: &str,
        user_identifier: &str,
    ) -> Result<Option<LikeState>> {
        self.report_repo()
            .toggle_comment_like(report_id, comment_public_id, user_identifier)
            .await
    }

    pub async fn comments_page(
        &self,
        report_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Option<CommentPage>> {
        self.report_repo()
            .comments_page(report_id, page, per_page)
            .await
    }

    pub async fn create_admin(&self, email: &str) -> Result<admins::Model> {
        self.admin_repo().create(email).await
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<admins::Model>> {
        self.admin_repo().get_by_email(email).await
    }

    pub async fn get_admin_by_session_token(&self, token: &str) -> Result<Option<admins::Model>> {
        self.admin_repo().get_by_session_token(token).await
    }

    pub async fn store_admin_challenge(
        &self,
        admin: admins::Model,
        code: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.admin_repo()
            .store_challenge(admin, code, expires_at)
            .await
    }

    pub async fn complete_admin_login(
        &self,
        admin: admins::Model,
        session_token: &str,
        session_expires_at: &str,
    ) -> Result<()> {
        self.admin_repo()
            .complete_login(admin, session_token, session_expires_at)
            .await
    }
}
