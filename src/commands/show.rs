use crate::api::{self, DataLoader};
use crate::args::ShowArgs;
use crate::commands::{emit, Out, Report};
use crate::export::export;
use crate::model::{Account, FinancedVehicle, Record, SalesEntry, Transaction, VacationRequest};
use crate::render::Renderer;
use crate::view::{Endpoint, View, ViewKind};
use crate::{Config, Mode, Result};
use anyhow::{bail, ensure};
use chrono::Local;
use std::path::Path;
use tracing::warn;

/// Loads the view named in `args`, applies its filters and page, and writes it once.
///
/// The output is written even when the load fails, so that an HTML page shows the error. The
/// command still fails in that case.
pub async fn show(config: Config, mode: Mode, args: &ShowArgs) -> Result<Out<Report>> {
    let loader = api::loader(&config, mode)?;
    show_with(&config, &loader, args).await
}

pub(super) async fn show_with(
    config: &Config,
    loader: &DataLoader,
    args: &ShowArgs,
) -> Result<Out<Report>> {
    match args.view() {
        ViewKind::Transactions => show_view::<Transaction>(config, loader, args).await,
        ViewKind::Accounts => show_view::<Account>(config, loader, args).await,
        ViewKind::Approvals => show_view::<VacationRequest>(config, loader, args).await,
        ViewKind::Sales => show_view::<SalesEntry>(config, loader, args).await,
        ViewKind::Financing => show_view::<FinancedVehicle>(config, loader, args).await,
    }
}

async fn show_view<R: Record>(
    config: &Config,
    loader: &DataLoader,
    args: &ShowArgs,
) -> Result<Out<Report>> {
    let page_size = args.page_size().unwrap_or(config.page_size());
    ensure!(page_size > 0, "The page size must be greater than zero");

    let mut view = View::<R>::new(page_size);
    view.set_filter(args.filters().to_state());
    let endpoint = R::VIEW.endpoint(Local::now().date_naive(), &args.params());
    reload(loader, &mut view, &endpoint).await;
    if args.page() != 1 && view.state().content().is_some() && !view.goto_page(args.page()) {
        warn!(
            "Page {} does not exist for the current filter, showing page 1",
            args.page()
        );
    }

    let rows = export(&mut Renderer::new(), &view, args.format())?;
    emit(&rows, args.out()).await?;
    if let Some(message) = view.state().error() {
        bail!("Unable to load {}: {message}", R::VIEW.noun());
    }

    let report = Report {
        view: R::VIEW.to_string(),
        format: args.format(),
        page: view.derive().map(|d| d.page),
        out: args.out().map(Path::to_path_buf),
    };
    Ok(Out::new(report.message(), report))
}

/// Takes `view` through `Loading` into `Content` or `Error`.
pub(super) async fn reload<R: Record>(loader: &DataLoader, view: &mut View<R>, endpoint: &Endpoint) {
    view.begin_reload();
    let result = loader.load_view::<R>(endpoint).await;
    view.finish_load(result);
}
