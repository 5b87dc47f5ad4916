use crate::api::{self, DataLoader};
use crate::args::WatchArgs;
use crate::commands::show::reload;
use crate::commands::{emit, Out, Report};
use crate::export::{export, Format};
use crate::model::{Account, FinancedVehicle, Record, SalesEntry, Transaction, VacationRequest};
use crate::poll::Poller;
use crate::render::Renderer;
use crate::view::{View, ViewKind};
use crate::{Config, Mode, Result};
use anyhow::{ensure, Context};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Loads the view named in `args` and rewrites its output file on every refresh until Ctrl-C.
///
/// A failed refresh is logged and the output shows the error until a later refresh succeeds. The
/// same `Renderer` is used for every refresh so that each chart canvas holds exactly one chart.
pub async fn watch(config: Config, mode: Mode, args: &WatchArgs) -> Result<Out<Report>> {
    let interval = match args.interval() {
        Some(secs) => Duration::from_secs(secs),
        None => config.refresh_interval(),
    };
    ensure!(!interval.is_zero(), "The interval must be greater than zero");
    let page_size = args.page_size().unwrap_or(config.page_size());
    ensure!(page_size > 0, "The page size must be greater than zero");

    let kind = args.view();
    let out = match args.out() {
        Some(path) => path.to_path_buf(),
        None => config
            .reports_dir()
            .join(format!("{kind}.{}", args.format().extension())),
    };
    let loader = api::loader(&config, mode)?;
    let settings = Settings {
        page_size,
        params: args.params(),
        format: args.format(),
        out,
    };
    match kind {
        ViewKind::Transactions => watch_view::<Transaction>(loader, settings, args, interval).await,
        ViewKind::Accounts => watch_view::<Account>(loader, settings, args, interval).await,
        ViewKind::Approvals => watch_view::<VacationRequest>(loader, settings, args, interval).await,
        ViewKind::Sales => watch_view::<SalesEntry>(loader, settings, args, interval).await,
        ViewKind::Financing => watch_view::<FinancedVehicle>(loader, settings, args, interval).await,
    }
}

async fn watch_view<R: Record>(
    loader: DataLoader,
    settings: Settings,
    args: &WatchArgs,
    interval: Duration,
) -> Result<Out<Report>> {
    let session = Arc::new(Session::<R>::new(loader, settings));
    session.set_filter(args).await;
    if let Err(e) = session.refresh().await {
        warn!("Refresh failed: {e:#}");
    }

    info!(
        "Watching {} every {}s, writing to {}. Press Ctrl-C to stop.",
        R::VIEW.noun(),
        interval.as_secs(),
        session.settings.out.display()
    );
    let ticking = session.clone();
    let poller = Poller::spawn(interval, move || {
        let session = ticking.clone();
        async move {
            if let Err(e) = session.refresh().await {
                warn!("Refresh failed: {e:#}");
            }
        }
    });
    tokio::signal::ctrl_c()
        .await
        .context("Unable to listen for Ctrl-C")?;
    poller.stop().await;

    let report = session.report().await;
    Ok(Out::new(format!("Stopped watching. {}", report.message()), report))
}

struct Settings {
    page_size: usize,
    params: Vec<(String, String)>,
    format: Format,
    out: PathBuf,
}

/// One watched view and the renderer that draws it.
struct Session<R: Record> {
    loader: DataLoader,
    settings: Settings,
    state: Mutex<(View<R>, Renderer)>,
}

impl<R: Record> Session<R> {
    fn new(loader: DataLoader, settings: Settings) -> Self {
        let view = View::new(settings.page_size);
        Self {
            loader,
            settings,
            state: Mutex::new((view, Renderer::new())),
        }
    }

    async fn set_filter(&self, args: &WatchArgs) {
        self.state.lock().await.0.set_filter(args.filters().to_state());
    }

    /// Reloads the view and rewrites the output. The endpoint is rebuilt each time so that the
    /// default sales period follows the calendar.
    async fn refresh(&self) -> Result<()> {
        let endpoint = R::VIEW.endpoint(Local::now().date_naive(), &self.settings.params);
        let mut state = self.state.lock().await;
        let (view, renderer) = &mut *state;
        reload(&self.loader, view, &endpoint).await;
        let rows = export(renderer, view, self.settings.format)?;
        emit(&rows, Some(&self.settings.out)).await?;
        match view.derive() {
            Some(derived) => info!("{}: {}", R::VIEW.title(), derived.page.range_label()),
            None => warn!("{} could not be loaded", R::VIEW.noun()),
        }
        Ok(())
    }

    async fn report(&self) -> Report {
        let state = self.state.lock().await;
        Report {
            view: R::VIEW.to_string(),
            format: self.settings.format,
            page: state.0.derive().map(|d| d.page),
            out: Some(self.settings.out.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RawResponse, TestBackend};
    use crate::test::TestEnv;
    use crate::utils;

    fn settings(out: PathBuf) -> Settings {
        Settings {
            page_size: 50,
            params: Vec::new(),
            format: Format::Html,
            out,
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_one_chart_per_canvas() {
        let env = TestEnv::new().await;
        let out = env.path("financing.html");
        let loader = DataLoader::new(Box::new(TestBackend::default()));
        let session = Session::<FinancedVehicle>::new(loader, settings(out.clone()));
        session.refresh().await.unwrap();
        session.refresh().await.unwrap();
        session.refresh().await.unwrap();
        let state = session.state.lock().await;
        let charts = state.1.charts();
        assert_eq!(charts.live(), 2);
        assert_eq!(charts.created() - charts.released(), 2);
        assert!(utils::read(&out).await.unwrap().contains("financing-by-institute"));
    }

    #[tokio::test]
    async fn test_refresh_recovers_after_error() {
        let env = TestEnv::new().await;
        let out = env.path("accounts.html");
        let backend = TestBackend::default();
        backend.set_response(ViewKind::Accounts.path(), RawResponse::new(502, ""));
        let loader = DataLoader::new(Box::new(backend.clone()));
        let session = Session::<Account>::new(loader, settings(out.clone()));

        session.refresh().await.unwrap();
        assert!(utils::read(&out).await.unwrap().contains("HTTP 502"));
        assert!(session.report().await.page.is_none());

        backend.set_response(
            ViewKind::Accounts.path(),
            RawResponse::new(200, r#"{"konten": [{"id": 1, "saldo": 5}]}"#),
        );
        session.refresh().await.unwrap();
        assert!(!utils::read(&out).await.unwrap().contains("HTTP 502"));
        assert_eq!(session.report().await.page.unwrap().count, 1);
    }
}
