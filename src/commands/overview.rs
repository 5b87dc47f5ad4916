use crate::api::{self, DataLoader};
use crate::args::OverviewArgs;
use crate::commands::{emit, Out, Report};
use crate::export::export_overview;
use crate::model::{DashboardOverview, Overview, Transaction};
use crate::render::Renderer;
use crate::view::{Endpoint, ViewState};
use crate::{Config, Mode, Result};
use anyhow::bail;
use std::path::Path;

/// How many of the latest bookings are listed under the overview.
const RECENT_TRANSACTIONS: usize = 10;

/// Loads and writes the bank overview.
pub async fn overview(config: Config, mode: Mode, args: &OverviewArgs) -> Result<Out<Report>> {
    let loader = api::loader(&config, mode)?;
    let state = load_overview(&loader).await;
    let rows = export_overview(&mut Renderer::new(), &state, args.format())?;
    emit(&rows, args.out()).await?;
    if let Some(message) = state.error() {
        bail!("Unable to load the overview: {message}");
    }
    let report = Report {
        view: "overview".to_string(),
        format: args.format(),
        page: None,
        out: args.out().map(Path::to_path_buf),
    };
    Ok(Out::new(report.message(), report))
}

/// Fetches the bank figures and the latest bookings at the same time. The overview fails if either
/// does.
async fn load_overview(loader: &DataLoader) -> ViewState<Overview> {
    let dashboard_endpoint = Endpoint::overview();
    let recent_endpoint = Endpoint::recent_transactions(RECENT_TRANSACTIONS);
    let (dashboard, recent) = tokio::join!(
        loader.load_object::<DashboardOverview>(&dashboard_endpoint),
        loader.load::<Transaction>(&recent_endpoint),
    );
    ViewState::from_result(
        dashboard.and_then(|dashboard| recent.map(|recent| Overview { dashboard, recent })),
    )
}
