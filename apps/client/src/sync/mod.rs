//! State Synchronizer — the top-level orchestrator.
//!
//! One injected instance owns the session, every cached collection, and
//! all domain clients. Callers read the current `AppSnapshot` (or watch it
//! via `subscribe`) and mutate exclusively through the methods here; every
//! state transition funnels through one mutex, which is what makes
//! transitions atomic between suspension points. In-memory state always
//! commits before the corresponding persisted write — a crash between the
//! two loses at most the latest mutation.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::CachedCollection;
use crate::clients::analytics::AnalyticsClient;
use crate::clients::applications::ApplicationsClient;
use crate::clients::auth::AuthClient;
use crate::clients::companies::CompaniesClient;
use crate::clients::jobs::{JobSearchQuery, JobsClient};
use crate::clients::notifications::NotificationsClient;
use crate::clients::profile::{ProfileClient, ProfileUpdate};
use crate::clients::saved_jobs::SavedJobsClient;
use crate::config::Config;
use crate::errors::{ApiError, AuthErrorKind, Result};
use crate::http::{Executor, ReqwestTransport, Timeouts, TokenCell, Transport};
use crate::models::{Application, Company, Identity, Job, Notification, UserProfile};
use crate::session::{SessionBoot, SessionStore};
use crate::store::{keys, KeyValueStore};

/// The state exposed to the UI. Cheap to clone; published on every commit.
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    /// True only before the boot sequence has read the lightweight flags.
    /// Never gated on the network.
    pub loading: bool,
    pub theme: String,
    pub onboarding_complete: bool,
    pub identity: Option<Identity>,
    pub jobs: CachedCollection<Job>,
    pub applications: CachedCollection<Application>,
    pub notifications: CachedCollection<Notification>,
    pub saved_job_ids: BTreeSet<String>,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            loading: true,
            theme: "light".to_string(),
            onboarding_complete: false,
            identity: None,
            jobs: CachedCollection::empty(),
            applications: CachedCollection::empty(),
            notifications: CachedCollection::empty(),
            saved_job_ids: BTreeSet::new(),
        }
    }
}

impl AppSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_job_saved(&self, job_id: &str) -> bool {
        self.saved_job_ids.contains(job_id)
    }

    /// Derived from the applications collection, so it converges with the
    /// server's one-live-application-per-job constraint.
    pub fn has_applied(&self, job_id: &str) -> bool {
        self.applications.items.iter().any(|a| a.job_id == job_id)
    }
}

pub struct Synchronizer {
    store: Arc<dyn KeyValueStore>,
    session: SessionStore,
    jobs: JobsClient,
    applications: ApplicationsClient,
    saved_jobs: SavedJobsClient,
    notifications: NotificationsClient,
    profile: ProfileClient,
    companies: CompaniesClient,
    analytics: AnalyticsClient,
    executor: Executor,
    state: Mutex<AppSnapshot>,
    tx: watch::Sender<AppSnapshot>,
}

impl Synchronizer {
    pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_transport(
            config.api_urls.clone(),
            Timeouts::from_config(config),
            store,
            Arc::new(ReqwestTransport::new()),
        )
    }

    /// Wires one executor per domain, all sharing the transport, token
    /// cell, and fallback policy.
    pub fn with_transport(
        origins: Vec<String>,
        timeouts: Timeouts,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let token = TokenCell::new();
        let exec = Executor::new(origins, transport, token.clone(), timeouts);

        let (tx, _) = watch::channel(AppSnapshot::default());
        Self {
            session: SessionStore::new(AuthClient::new(exec.clone()), store.clone(), token),
            jobs: JobsClient::new(exec.clone()),
            applications: ApplicationsClient::new(exec.clone()),
            saved_jobs: SavedJobsClient::new(exec.clone()),
            notifications: NotificationsClient::new(exec.clone()),
            profile: ProfileClient::new(exec.clone()),
            companies: CompaniesClient::new(exec.clone()),
            analytics: AnalyticsClient::new(exec.clone()),
            executor: exec,
            store,
            state: Mutex::new(AppSnapshot::default()),
            tx,
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.state.lock().unwrap().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.tx.subscribe()
    }

    /// The single dispatch point: lock, mutate, publish. Never held across
    /// a suspension point.
    fn commit(&self, mutate: impl FnOnce(&mut AppSnapshot)) {
        let mut state = self.state.lock().unwrap();
        mutate(&mut state);
        let _ = self.tx.send(state.clone());
    }

    /// Drops every user-scoped collection, in memory and on disk.
    async fn drop_user_collections(&self) {
        self.commit(|s| {
            s.applications = CachedCollection::empty();
            s.notifications = CachedCollection::empty();
            s.saved_job_ids = BTreeSet::new();
        });
        self.store.remove(keys::APPLICATIONS).await;
        self.store.remove(keys::NOTIFICATIONS).await;
        self.store.remove(keys::SAVED_JOB_IDS).await;
    }

    /// Forced sign-out: an authenticated call came back with an auth
    /// rejection mid-session. Same end state as a rejected boot-time
    /// validation — no token, no identity, no user-scoped collections.
    async fn invalidate_session(&self, kind: AuthErrorKind) {
        self.session.invalidate(kind).await;
        self.commit(|s| s.identity = None);
        self.drop_user_collections().await;
    }

    /// Routes an auth rejection from any authenticated call into the
    /// forced `Unauthenticated` transition before handing the error back.
    async fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ApiError::Auth(kind)) = &result {
            self.invalidate_session(*kind).await;
        }
        result
    }

    // ────────────────────────────────────────────────────────────────────
    // Boot & refresh
    // ────────────────────────────────────────────────────────────────────

    /// The cache-first boot sequence. Returns the session restore outcome
    /// so the UI can message a rejected token.
    pub async fn boot(&self) -> SessionBoot {
        // 1+2: lightweight flags, then stop blocking the UI. The network
        // plays no part in `loading`.
        let theme = self.store.get(keys::THEME).await;
        let onboarding = self.store.get(keys::ONBOARDING_COMPLETE).await;
        self.commit(|s| {
            if let Some(theme) = theme {
                s.theme = theme;
            }
            s.onboarding_complete = onboarding.as_deref() == Some("true");
            s.loading = false;
        });

        // 3: publish the stale job snapshot before any network round-trip.
        if let Some(snapshot) = CachedCollection::<Job>::load(self.store.as_ref(), keys::JOBS).await
        {
            self.commit(|s| s.jobs = snapshot);
        }

        // 4: fresh jobs; a failure keeps the stale snapshot authoritative.
        self.refresh_jobs().await;

        // 5/6: user-scoped collections, only with a live session.
        let boot = self.session.restore().await;
        match &boot {
            SessionBoot::Authenticated(identity) => {
                let identity = identity.clone();
                self.commit(|s| s.identity = Some(identity));
                self.fan_out().await;
            }
            SessionBoot::NoToken | SessionBoot::Rejected(_) => {
                self.commit(|s| s.identity = None);
                self.drop_user_collections().await;
            }
        }
        boot
    }

    /// Pull-to-refresh: repeats the network half of boot without touching
    /// the flags or re-reading persisted snapshots.
    pub async fn refresh(&self) {
        self.refresh_jobs().await;
        if self.session.is_authenticated() {
            self.fan_out().await;
        }
    }

    async fn refresh_jobs(&self) {
        match self.jobs.search(&JobSearchQuery::default()).await {
            Ok(items) => {
                let fresh = CachedCollection::from_network(items);
                self.commit(|s| s.jobs = fresh.clone());
                fresh.persist(self.store.as_ref(), keys::JOBS).await;
            }
            Err(e) => warn!("job refresh failed, keeping stale snapshot: {e}"),
        }
    }

    /// Settle-all, report-partial: the three fetches run concurrently and
    /// each commits its own collection on its own completion. A failure is
    /// logged and leaves its collection at the prior value; siblings are
    /// unaffected.
    async fn fan_out(&self) {
        tokio::join!(
            async {
                match self.applications.list().await {
                    Ok(items) => {
                        let fresh = CachedCollection::from_network(items);
                        self.commit(|s| s.applications = fresh.clone());
                        fresh.persist(self.store.as_ref(), keys::APPLICATIONS).await;
                    }
                    Err(e) => self.report_fetch_failure("applications", e).await,
                }
            },
            async {
                match self.notifications.list().await {
                    Ok(items) => {
                        let fresh = CachedCollection::from_network(items);
                        self.commit(|s| s.notifications = fresh.clone());
                        fresh.persist(self.store.as_ref(), keys::NOTIFICATIONS).await;
                    }
                    Err(e) => self.report_fetch_failure("notifications", e).await,
                }
            },
            async {
                match self.saved_jobs.list_ids().await {
                    Ok(ids) => {
                        let ids: BTreeSet<String> = ids.into_iter().collect();
                        self.commit(|s| s.saved_job_ids = ids.clone());
                        self.persist_saved_ids(&ids).await;
                    }
                    Err(e) => self.report_fetch_failure("saved jobs", e).await,
                }
            },
        );
    }

    /// A fan-out fetch failure stays non-blocking for its siblings, but an
    /// auth rejection still tears the session down.
    async fn report_fetch_failure(&self, what: &str, e: ApiError) {
        match e {
            ApiError::Auth(kind) => self.invalidate_session(kind).await,
            e => warn!("{what} fetch failed: {e}"),
        }
    }

    async fn persist_saved_ids(&self, ids: &BTreeSet<String>) {
        match serde_json::to_string(ids) {
            Ok(raw) => self.store.set(keys::SAVED_JOB_IDS, &raw).await,
            Err(e) => warn!("failed to serialize saved job ids: {e}"),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Session
    // ────────────────────────────────────────────────────────────────────

    /// Any successful identity change drops the previous user's
    /// collections before fetching the new user's — signing in over an
    /// existing session must never show the prior account's data.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.session.login(email, password).await?;
        self.commit(|s| s.identity = Some(identity.clone()));
        self.drop_user_collections().await;
        self.fan_out().await;
        Ok(identity)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Identity> {
        let identity = self.session.register(name, email, password, role).await?;
        self.commit(|s| s.identity = Some(identity.clone()));
        self.drop_user_collections().await;
        self.fan_out().await;
        Ok(identity)
    }

    /// Ends the session and drops everything user-scoped. The anonymous
    /// job collection, theme, and onboarding flag survive.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.commit(|s| s.identity = None);
        self.drop_user_collections().await;
    }

    // ────────────────────────────────────────────────────────────────────
    // Mutations
    // ────────────────────────────────────────────────────────────────────

    /// Network-first apply. A conflict (already applied) is a genuine
    /// business error and rejects; nothing is written locally on failure.
    pub async fn apply_to_job(
        &self,
        job_id: &str,
        cover_letter: Option<&str>,
        resume_url: Option<&str>,
    ) -> Result<Application> {
        let created = self
            .guard(self.applications.apply(job_id, cover_letter, resume_url).await)
            .await?;

        let (snapshot, application) = {
            let mut state = self.state.lock().unwrap();
            state.applications.items.push(created.clone());
            let _ = self.tx.send(state.clone());
            (state.applications.clone(), created)
        };
        snapshot.persist(self.store.as_ref(), keys::APPLICATIONS).await;

        info!("applied to {job_id}");
        self.analytics.track("job_applied", json!({ "jobId": job_id })).await;
        Ok(application)
    }

    /// Withdraws an application and drops it from the cache.
    pub async fn withdraw_application(&self, id: &str) -> Result<()> {
        self.guard(self.applications.withdraw(id).await).await?;
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            state.applications.items.retain(|a| a.id != id);
            let _ = self.tx.send(state.clone());
            state.applications.clone()
        };
        snapshot.persist(self.store.as_ref(), keys::APPLICATIONS).await;
        Ok(())
    }

    /// Network-first idempotent save. Success and already-saved both land
    /// the id in the saved set exactly once; only real failures reject.
    pub async fn save_job(&self, job_id: &str) -> Result<()> {
        self.guard(self.saved_jobs.save(job_id).await).await?;

        let ids = {
            let mut state = self.state.lock().unwrap();
            state.saved_job_ids.insert(job_id.to_string());
            let _ = self.tx.send(state.clone());
            state.saved_job_ids.clone()
        };
        self.persist_saved_ids(&ids).await;

        self.analytics.track("job_saved", json!({ "jobId": job_id })).await;
        Ok(())
    }

    pub async fn unsave_job(&self, job_id: &str) -> Result<()> {
        self.guard(self.saved_jobs.unsave(job_id).await).await?;

        let ids = {
            let mut state = self.state.lock().unwrap();
            state.saved_job_ids.remove(job_id);
            let _ = self.tx.send(state.clone());
            state.saved_job_ids.clone()
        };
        self.persist_saved_ids(&ids).await;
        Ok(())
    }

    /// Read receipts are availability-over-consistency by policy: the
    /// local flag flips even when the network call fails, and the failure
    /// is only logged. The one sanctioned exception to network-first —
    /// though an auth rejection still ends the session, at which point
    /// there is no notification collection left to flag.
    pub async fn mark_notification_read(&self, id: &str) {
        match self.notifications.mark_read(id).await {
            Ok(()) => {}
            Err(ApiError::Auth(kind)) => {
                self.invalidate_session(kind).await;
                return;
            }
            Err(e) => warn!("mark-read for {id} failed remotely, keeping local flag: {e}"),
        }

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            for notification in &mut state.notifications.items {
                if notification.id == id {
                    notification.is_read = true;
                }
            }
            let _ = self.tx.send(state.clone());
            state.notifications.clone()
        };
        snapshot.persist(self.store.as_ref(), keys::NOTIFICATIONS).await;
    }

    // ────────────────────────────────────────────────────────────────────
    // Preferences
    // ────────────────────────────────────────────────────────────────────

    pub async fn set_theme(&self, theme: &str) {
        self.commit(|s| s.theme = theme.to_string());
        self.store.set(keys::THEME, theme).await;
    }

    pub async fn complete_onboarding(&self) {
        self.commit(|s| s.onboarding_complete = true);
        self.store.set(keys::ONBOARDING_COMPLETE, "true").await;
    }

    // ────────────────────────────────────────────────────────────────────
    // Pass-through queries (no collection backs these)
    // ────────────────────────────────────────────────────────────────────

    pub async fn search_jobs(&self, query: &JobSearchQuery) -> Result<Vec<Job>> {
        self.jobs.search(query).await
    }

    pub async fn recommended_jobs(&self) -> Result<Vec<Job>> {
        self.guard(self.jobs.recommended().await).await
    }

    pub async fn user_profile(&self) -> Result<UserProfile> {
        self.guard(self.profile.get().await).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.guard(self.profile.update(update).await).await
    }

    pub async fn companies(&self) -> Result<Vec<Company>> {
        self.companies.list().await
    }

    pub async fn company(&self, id: &str) -> Result<Company> {
        self.companies.get(id).await
    }

    /// Liveness check across the candidate origins; resolves with the
    /// first healthy one.
    pub async fn probe(&self) -> Result<String> {
        self.executor.probe().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::cache::CacheSource;
    use crate::errors::ApiError;
    use crate::http::testing::{FakeOutcome, FakeTransport};
    use crate::models::ApplicationStatus;
    use crate::store::MemoryStore;

    const A: &str = "http://a";

    fn harness(transport: Arc<FakeTransport>, store: Arc<MemoryStore>) -> Synchronizer {
        Synchronizer::with_transport(
            vec![A.to_string()],
            Timeouts {
                standard: Duration::from_secs(10),
                probe: Duration::from_secs(3),
                upload: Duration::from_secs(30),
            },
            store,
            transport,
        )
    }

    fn me_body() -> serde_json::Value {
        json!({"id": "u1", "email": "a@x.com", "name": "A", "role": "employee"})
    }

    fn notification_body(id: &str, read: bool) -> serde_json::Value {
        json!({
            "id": id,
            "userId": "u1",
            "title": "Application update",
            "message": "Your application moved forward",
            "type": "application",
            "isRead": read,
        })
    }

    fn application_body(id: &str, job_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "jobId": job_id,
            "status": "pending",
            "appliedAt": "2026-08-01T10:00:00Z",
        })
    }

    /// Scripts the full authenticated boot: jobs, /auth/me, and the three
    /// fan-out endpoints.
    fn script_authenticated_boot(transport: &FakeTransport) {
        transport.on(
            &format!("{A}/api/search/jobs"),
            FakeOutcome::Reply(200, json!([{"id": "job_1", "title": "Rust Engineer"}])),
        );
        transport.on(&format!("{A}/api/auth/me"), FakeOutcome::Reply(200, me_body()));
        transport.on(&format!("{A}/api/applications"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/notifications"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/saved-jobs"), FakeOutcome::Reply(200, json!([])));
    }

    #[tokio::test]
    async fn test_boot_without_session_sets_empty_user_collections() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            &format!("{A}/api/search/jobs"),
            FakeOutcome::Reply(200, json!([{"id": "job_1"}])),
        );

        let sync = harness(transport, store);
        assert!(sync.snapshot().loading);

        let boot = sync.boot().await;
        assert_eq!(boot, SessionBoot::NoToken);

        let snapshot = sync.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.identity.is_none());
        assert_eq!(snapshot.jobs.len(), 1);
        assert_eq!(snapshot.jobs.source, CacheSource::Network);
        // Explicitly empty, not absent.
        assert!(snapshot.applications.is_empty());
        assert!(snapshot.notifications.is_empty());
        assert!(snapshot.saved_job_ids.is_empty());
    }

    #[tokio::test]
    async fn test_boot_network_failure_keeps_stale_jobs() {
        let store = Arc::new(MemoryStore::new());
        CachedCollection::from_network(vec![
            serde_json::from_value::<Job>(json!({"id": "job_stale"})).unwrap(),
        ])
        .persist(store.as_ref(), keys::JOBS)
        .await;

        // Every candidate down for the jobs fetch.
        let transport = Arc::new(FakeTransport::new());
        transport.on(&format!("{A}/api/search/jobs"), FakeOutcome::Fail("unreachable"));

        let sync = harness(transport, store);
        sync.boot().await;

        let snapshot = sync.snapshot();
        assert!(!snapshot.loading, "loading never waits on the network");
        assert_eq!(snapshot.jobs.len(), 1);
        assert_eq!(snapshot.jobs.items[0].id, "job_stale");
        assert_eq!(snapshot.jobs.source, CacheSource::Persisted);
    }

    #[tokio::test]
    async fn test_fan_out_partial_failure_is_isolated() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::TOKEN, "abc").await;

        let transport = Arc::new(FakeTransport::new());
        transport.on(&format!("{A}/api/search/jobs"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/auth/me"), FakeOutcome::Reply(200, me_body()));
        // Applications endpoint down; notifications and saved jobs healthy.
        transport.on(
            &format!("{A}/api/applications"),
            FakeOutcome::Reply(500, json!({"message": "boom"})),
        );
        transport.on(
            &format!("{A}/api/notifications"),
            FakeOutcome::Reply(
                200,
                json!([
                    notification_body("n1", false),
                    notification_body("n2", false),
                    notification_body("n3", true),
                ]),
            ),
        );
        transport.on(
            &format!("{A}/api/saved-jobs"),
            FakeOutcome::Reply(200, json!([{"id": "sj_1", "jobId": "job_9"}])),
        );

        let sync = harness(transport, store);
        sync.boot().await;

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.notifications.len(), 3);
        assert!(snapshot.saved_job_ids.contains("job_9"));
        // The failed fetch left its collection at the prior value.
        assert!(snapshot.applications.is_empty());
        assert_eq!(snapshot.applications.source, CacheSource::Persisted);
    }

    #[tokio::test]
    async fn test_save_job_twice_converges_to_one_entry() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;
        // First save succeeds, second reports the idempotent conflict.
        transport.on(
            &format!("{A}/api/saved-jobs"),
            FakeOutcome::Reply(201, json!({"id": "sj_1", "jobId": "job_42"})),
        );
        transport.on(
            &format!("{A}/api/saved-jobs"),
            FakeOutcome::Reply(409, json!({"message": "Job already saved"})),
        );

        let sync = harness(transport, store.clone());
        sync.boot().await;

        sync.save_job("job_42").await.unwrap();
        sync.save_job("job_42").await.unwrap(); // conflict path, no error

        let snapshot = sync.snapshot();
        assert_eq!(
            snapshot.saved_job_ids.iter().filter(|id| *id == "job_42").count(),
            1
        );

        // And the persisted set matches.
        let raw = store.get(keys::SAVED_JOB_IDS).await.unwrap();
        let persisted: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec!["job_42"]);
    }

    #[tokio::test]
    async fn test_duplicate_application_rejects_and_leaves_list_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;
        transport.on(
            &format!("{A}/api/applications"),
            FakeOutcome::Reply(201, application_body("app_1", "job_7")),
        );
        transport.on(
            &format!("{A}/api/applications"),
            FakeOutcome::Reply(409, json!({"message": "You have already applied to this job"})),
        );

        let sync = harness(transport, store);
        sync.boot().await;

        let first = sync.apply_to_job("job_7", Some("Dear team"), None).await.unwrap();
        assert_eq!(first.status, ApplicationStatus::Pending);
        assert_eq!(sync.snapshot().applications.len(), 1);
        assert!(sync.snapshot().has_applied("job_7"));

        let err = sync.apply_to_job("job_7", None, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(sync.snapshot().applications.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_flips_locally_even_when_network_fails() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        // Scripted before the boot helper so the boot fan-out consumes
        // this reply rather than the helper's empty one.
        transport.on(
            &format!("{A}/api/notifications"),
            FakeOutcome::Reply(200, json!([notification_body("n1", false)])),
        );
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;
        transport.on(
            &format!("{A}/api/notifications/n1/read"),
            FakeOutcome::Fail("unreachable"),
        );

        let sync = harness(transport, store);
        sync.boot().await;
        assert!(!sync.snapshot().notifications.items[0].is_read);

        sync.mark_notification_read("n1").await;
        assert!(sync.snapshot().notifications.items[0].is_read);
    }

    #[tokio::test]
    async fn test_logout_keeps_anonymous_state() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;
        store.set(keys::THEME, "dark").await;

        let sync = harness(transport, store.clone());
        let boot = sync.boot().await;
        assert!(matches!(boot, SessionBoot::Authenticated(_)));

        sync.logout().await;

        let snapshot = sync.snapshot();
        assert!(snapshot.identity.is_none());
        assert!(snapshot.applications.is_empty());
        assert!(snapshot.saved_job_ids.is_empty());
        // Anonymous state survives.
        assert_eq!(snapshot.jobs.len(), 1);
        assert_eq!(snapshot.theme, "dark");
        assert_eq!(store.get(keys::JOBS).await.is_some(), true);
        assert_eq!(store.get(keys::TOKEN).await, None);
        assert_eq!(store.get(keys::SAVED_JOB_IDS).await, None);
    }

    #[tokio::test]
    async fn test_auth_rejection_mid_session_forces_sign_out() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;

        let sync = harness(transport.clone(), store.clone());
        sync.boot().await;
        assert!(sync.snapshot().is_authenticated());

        // The token dies server-side; every fan-out fetch now rejects it.
        let expired = || {
            FakeOutcome::Reply(401, json!({"code": "TOKEN_EXPIRED", "message": "Token expired"}))
        };
        transport.on(&format!("{A}/api/search/jobs"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/applications"), expired());
        transport.on(&format!("{A}/api/notifications"), expired());
        transport.on(&format!("{A}/api/saved-jobs"), expired());

        sync.refresh().await;

        let snapshot = sync.snapshot();
        assert!(snapshot.identity.is_none());
        assert!(snapshot.applications.is_empty());
        assert!(snapshot.saved_job_ids.is_empty());
        assert_eq!(store.get(keys::TOKEN).await, None, "expired token must be cleared");
        assert_eq!(store.get(keys::IDENTITY).await, None);
    }

    #[tokio::test]
    async fn test_rejected_mutation_tears_the_session_down() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;
        transport.on(
            &format!("{A}/api/saved-jobs"),
            FakeOutcome::Reply(401, json!({"code": "TOKEN_INVALID", "message": "Token invalid"})),
        );

        let sync = harness(transport, store.clone());
        sync.boot().await;

        let err = sync.save_job("job_42").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthErrorKind::TokenInvalid)));

        let snapshot = sync.snapshot();
        assert!(snapshot.identity.is_none());
        assert!(!snapshot.is_job_saved("job_42"));
        assert_eq!(store.get(keys::TOKEN).await, None);
    }

    #[tokio::test]
    async fn test_register_over_live_session_drops_previous_account_data() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        // First account boots with one saved job and one notification.
        transport.on(
            &format!("{A}/api/saved-jobs"),
            FakeOutcome::Reply(200, json!([{"id": "sj_1", "jobId": "job_9"}])),
        );
        transport.on(
            &format!("{A}/api/notifications"),
            FakeOutcome::Reply(200, json!([notification_body("n1", false)])),
        );
        script_authenticated_boot(&transport);
        store.set(keys::TOKEN, "abc").await;

        let sync = harness(transport.clone(), store.clone());
        sync.boot().await;
        assert!(sync.snapshot().is_job_saved("job_9"));
        assert_eq!(sync.snapshot().notifications.len(), 1);

        // Register a fresh account without signing out first.
        transport.on(
            &format!("{A}/api/auth/register"),
            FakeOutcome::Reply(
                201,
                json!({"token": "xyz", "user": {"id": "u2", "email": "b@x.com", "name": "B", "role": "employee"}}),
            ),
        );
        transport.on(&format!("{A}/api/applications"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/notifications"), FakeOutcome::Reply(200, json!([])));
        transport.on(&format!("{A}/api/saved-jobs"), FakeOutcome::Reply(200, json!([])));

        let identity = sync.register("B", "b@x.com", "pw", "employee").await.unwrap();
        assert_eq!(identity.id, "u2");

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.identity.as_ref().map(|i| i.id.as_str()), Some("u2"));
        // Nothing of the first account survives the switch.
        assert!(!snapshot.is_job_saved("job_9"));
        assert!(snapshot.notifications.is_empty());
        assert_eq!(store.get(keys::TOKEN).await, Some("xyz".to_string()));
    }

    #[tokio::test]
    async fn test_probe_reports_first_healthy_origin() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        transport.on(&format!("{A}/health"), FakeOutcome::Reply(200, json!({"status": "ok"})));

        let sync = harness(transport, store);
        assert_eq!(sync.probe().await.unwrap(), A);
    }

    #[tokio::test]
    async fn test_refresh_skips_flag_reads() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        transport.on(&format!("{A}/api/search/jobs"), FakeOutcome::Reply(200, json!([])));
        transport.on(
            &format!("{A}/api/search/jobs"),
            FakeOutcome::Reply(200, json!([{"id": "job_1"}, {"id": "job_2"}])),
        );

        let sync = harness(transport, store.clone());
        sync.boot().await;
        assert_eq!(sync.snapshot().jobs.len(), 0);

        // Flip the persisted theme behind the synchronizer's back; refresh
        // must not re-read it.
        store.set(keys::THEME, "dark").await;
        sync.refresh().await;

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.jobs.len(), 2);
        assert_eq!(snapshot.theme, "light");
    }

    #[tokio::test]
    async fn test_subscribers_observe_commits() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        transport.on(&format!("{A}/api/search/jobs"), FakeOutcome::Reply(200, json!([])));

        let sync = harness(transport, store);
        let mut rx = sync.subscribe();

        sync.boot().await;
        rx.changed().await.unwrap();
        assert!(!rx.borrow().loading);

        sync.set_theme("dark").await;
        assert_eq!(sync.subscribe().borrow().theme, "dark");
    }
}
