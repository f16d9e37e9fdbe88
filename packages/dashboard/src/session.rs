//! The explicit session object owned by the front end.
//!
//! A session holds what the dashboard shows between loads: the current ZIP
//! code, the map state, the submit control and the status board. Starting
//! a load while another is in flight aborts the older one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use census_explorer_geography_models::ZipCode;
use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;

use crate::load::{DashboardServices, LoadError, LoadRequest, run_valid_load};
use crate::notify::{Notification, NotificationLevel, StatusBoard};
use crate::view::{DashboardView, MapView};

/// How a call to [`DashboardSession::load`] ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The view was rendered.
    Loaded(Box<DashboardView>),
    /// Validation or the primary fetch failed; a danger notification was
    /// posted.
    Failed(LoadError),
    /// A newer load started before this one finished.
    Superseded,
}

#[derive(Debug)]
struct SessionState {
    generation: u64,
    in_flight: Option<AbortHandle>,
    current_zip: Option<ZipCode>,
    map: MapView,
    submit_enabled: bool,
    board: StatusBoard,
    last_view: Option<DashboardView>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            generation: 0,
            in_flight: None,
            current_zip: None,
            map: MapView::default(),
            submit_enabled: true,
            board: StatusBoard::new(),
            last_view: None,
        }
    }
}

/// Dashboard session. Cloning shares the same session.
#[derive(Clone)]
pub struct DashboardSession {
    services: Arc<DashboardServices>,
    state: Arc<Mutex<SessionState>>,
}

impl DashboardSession {
    #[must_use]
    pub fn new(services: DashboardServices) -> Self {
        Self {
            services: Arc::new(services),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a load, aborting any load still in flight.
    ///
    /// Messages from the previous load are cleared first. Invalid input is
    /// reported without any network call and leaves an in-flight load
    /// running.
    pub async fn load(&self, request: LoadRequest) -> LoadOutcome {
        let (valid, generation) = {
            let mut state = self.state();
            state.board.clear();

            let valid = match request.validate() {
                Ok(valid) => valid,
                Err(e) => {
                    state.board.push(NotificationLevel::Danger, e.user_message());
                    return LoadOutcome::Failed(e);
                }
            };

            if let Some(previous) = state.in_flight.take() {
                log::debug!("Aborting in-flight load");
                previous.abort();
            }
            state.generation += 1;
            (valid, state.generation)
        };

        let services = Arc::clone(&self.services);
        let task = tokio::spawn(async move { run_valid_load(&services, &valid).await });

        {
            let mut state = self.state();
            if state.generation != generation {
                // A newer load started between the two critical sections
                // and could not see this task's handle.
                task.abort();
                return LoadOutcome::Superseded;
            }
            state.submit_enabled = false;
            state.in_flight = Some(task.abort_handle());
        }

        let result = match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => return LoadOutcome::Superseded,
            Err(e) => {
                log::error!("Load task failed: {e}");
                let mut state = self.state();
                if state.generation == generation {
                    state.in_flight = None;
                    state.submit_enabled = true;
                }
                return LoadOutcome::Superseded;
            }
        };

        let mut state = self.state();
        if state.generation != generation {
            return LoadOutcome::Superseded;
        }
        state.in_flight = None;
        state.submit_enabled = true;

        match result {
            Ok(report) => {
                for (level, message) in report.notifications() {
                    state.board.push(level, message);
                }
                state.current_zip = Some(report.view.zip.clone());
                if let Some(map) = &report.view.map {
                    state.map = map.clone();
                }
                state.last_view = Some(report.view.clone());
                LoadOutcome::Loaded(Box::new(report.view))
            }
            Err(e) => {
                for (level, message) in e.notifications() {
                    state.board.push(level, message);
                }
                if let LoadError::PrimaryFetch { map: Some(map), .. } = &e {
                    state.map = map.clone();
                }
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        self.state().submit_enabled
    }

    #[must_use]
    pub fn current_zip(&self) -> Option<ZipCode> {
        self.state().current_zip.clone()
    }

    /// Map state. Keeps the last located marker when a lookup fails.
    #[must_use]
    pub fn map(&self) -> MapView {
        self.state().map.clone()
    }

    #[must_use]
    pub fn last_view(&self) -> Option<DashboardView> {
        self.state().last_view.clone()
    }

    /// Notifications still visible at `now`.
    #[must_use]
    pub fn notifications(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut state = self.state();
        state.board.prune(now);
        state.board.all().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::tests::{acs_record, nyc, services, zip};
    use crate::load::{COMPARISON_FAILED_MESSAGE, INVALID_ZIP_MESSAGE, LOADED_MESSAGE};
    use census_explorer_geocoder::StaticLookup;
    use census_explorer_metric_models::{MetricSource, Period};
    use census_explorer_source::fixture::FixtureSource;
    use std::time::Duration;

    fn messages(session: &DashboardSession) -> Vec<(NotificationLevel, String)> {
        session
            .notifications(Utc::now())
            .into_iter()
            .map(|n| (n.level, n.message))
            .collect()
    }

    #[tokio::test]
    async fn successful_load_updates_session() {
        let acs = FixtureSource::new(MetricSource::Acs).with_record(
            &zip("10001"),
            Period::LATEST,
            acs_record("42"),
        );
        let session = DashboardSession::new(services(acs, StaticLookup::new().with_location(nyc())));
        assert_eq!(session.map().zoom, 10);

        let outcome = session.load(LoadRequest::new("10001", "2023")).await;
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        assert!(session.submit_enabled());
        assert_eq!(session.current_zip(), Some(zip("10001")));
        assert_eq!(session.map().zoom, 12);
        assert!(session.last_view().is_some());
        assert_eq!(
            messages(&session),
            vec![(NotificationLevel::Success, LOADED_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn validation_failure_keeps_submit_enabled() {
        let acs = FixtureSource::new(MetricSource::Acs);
        let session = DashboardSession::new(services(acs, StaticLookup::new()));

        let outcome = session.load(LoadRequest::new("abcde", "2023")).await;
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Validation { .. })));
        assert!(session.submit_enabled());
        assert_eq!(
            messages(&session),
            vec![(NotificationLevel::Danger, INVALID_ZIP_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn primary_failure_re_enables_submit() {
        let acs = FixtureSource::new(MetricSource::Acs).failing_period(Period::LATEST);
        let session = DashboardSession::new(services(acs, StaticLookup::new().with_location(nyc())));

        let outcome = session.load(LoadRequest::new("10001", "2023")).await;
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::PrimaryFetch { .. })));
        assert_eq!(session.map().zoom, 12);
        assert!(session.submit_enabled());
        let messages = messages(&session);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, NotificationLevel::Danger);
        assert!(messages[0].1.starts_with("Error loading data: "));
    }

    #[tokio::test]
    async fn new_load_clears_previous_messages() {
        let acs = FixtureSource::new(MetricSource::Acs)
            .with_record(&zip("10001"), Period::LATEST, acs_record("1"))
            .failing_period(Period::from_year(2019));
        let session = DashboardSession::new(services(acs, StaticLookup::new().with_location(nyc())));

        session
            .load(LoadRequest::new("10001", "2023").with_comparison("2019"))
            .await;
        assert_eq!(messages(&session).len(), 2);
        assert_eq!(messages(&session)[0].1, COMPARISON_FAILED_MESSAGE);

        session.load(LoadRequest::new("10001", "2023")).await;
        assert_eq!(
            messages(&session),
            vec![(NotificationLevel::Success, LOADED_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn newer_load_supersedes_older() {
        let slow = zip("94105");
        let acs = FixtureSource::new(MetricSource::Acs)
            .with_record(&slow, Period::LATEST, acs_record("1"))
            .with_record(&zip("10001"), Period::LATEST, acs_record("2"))
            .with_delay(&slow, Duration::from_secs(30));
        let session = DashboardSession::new(services(acs, StaticLookup::new().with_location(nyc())));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.load(LoadRequest::new("94105", "2023")).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!session.submit_enabled());

        let second = session.load(LoadRequest::new("10001", "2023")).await;
        assert!(matches!(second, LoadOutcome::Loaded(_)));

        let first = tokio::time::timeout(Duration::from_secs(5), first)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, LoadOutcome::Superseded));
        assert!(session.submit_enabled());
        assert_eq!(session.current_zip(), Some(zip("10001")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_loads_leave_only_the_newest() {
        let zips: Vec<String> = (1..=12).map(|i| format!("100{i:02}")).collect();
        let acs = zips.iter().fold(FixtureSource::new(MetricSource::Acs), |acs, z| {
            acs.with_record(&zip(z), Period::LATEST, acs_record("7"))
                .with_delay(&zip(z), Duration::from_millis(300))
        });
        let session = DashboardSession::new(services(acs, StaticLookup::new().with_location(nyc())));

        let tasks: Vec<_> = zips
            .iter()
            .map(|z| {
                let session = session.clone();
                let request = LoadRequest::new(z.clone(), "2023");
                tokio::spawn(async move { session.load(request).await })
            })
            .collect();

        let mut loaded = Vec::new();
        for task in tasks {
            let outcome = tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .unwrap()
                .unwrap();
            match outcome {
                LoadOutcome::Loaded(view) => loaded.push(view.zip),
                LoadOutcome::Superseded => {}
                LoadOutcome::Failed(e) => panic!("unexpected failure: {e}"),
            }
        }

        assert_eq!(loaded.len(), 1, "{loaded:?}");
        assert_eq!(session.current_zip().as_ref(), Some(&loaded[0]));
        assert_eq!(session.last_view().unwrap().zip, loaded[0]);
        assert!(session.submit_enabled());
    }
}
