use crate::api;
use crate::args::DecisionArgs;
use crate::commands::Out;
use crate::model::{Action, Decision, DecisionOutcome};
use crate::{Config, Mode, Result};
use anyhow::Context;

/// Approves or rejects the vacation requests named in `args`. The decision is validated before
/// anything is sent, so a rejection without a reason never reaches the portal.
pub async fn decide(
    config: Config,
    mode: Mode,
    action: Action,
    args: &DecisionArgs,
) -> Result<Out<DecisionOutcome>> {
    let decision = Decision::new(
        action,
        args.ids().to_vec(),
        args.comment().map(str::to_string),
    )?;
    let loader = api::loader(&config, mode)?;
    let outcome = api::submit(&loader, &decision)
        .await
        .with_context(|| format!("Unable to {action} {:?}", decision.request_ids()))?;
    Ok(Out::new(outcome.message(), outcome))
}
