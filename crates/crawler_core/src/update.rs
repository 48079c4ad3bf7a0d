use crate::{Effect, Msg, Pause, Resolution, RetryPolicy, StorageFailurePolicy, UnitState};

/// Pure update function: applies a message for the current unit and returns
/// the effects the engine has to carry out, in order.
pub fn update(mut state: UnitState, msg: Msg, policy: &RetryPolicy) -> (UnitState, Vec<Effect>) {
    let effects = match msg {
        Msg::Fetched => vec![Effect::Store],
        Msg::Stored => {
            state.reset();
            resolve(Resolution::Stored)
        }
        Msg::NotFound => {
            state.reset();
            resolve(Resolution::Absent)
        }
        Msg::RateLimited => {
            // Not counted against the retry budget.
            state.record_rate_limit();
            vec![Effect::Sleep(Pause::Cooldown), Effect::Retry]
        }
        Msg::Transient(detail) => failure(&mut state, detail, policy),
        Msg::StoreFailed(detail) => match policy.storage {
            StorageFailurePolicy::SkipUnit => {
                state.reset();
                skip(format!("storage failure: {detail}"))
            }
            StorageFailurePolicy::RetryUnit => {
                failure(&mut state, format!("storage failure: {detail}"), policy)
            }
        },
        Msg::Fatal(detail) => vec![Effect::Halt(detail)],
    };

    (state, effects)
}

fn failure(state: &mut UnitState, detail: String, policy: &RetryPolicy) -> Vec<Effect> {
    let attempts = state.record_failure();
    if attempts < policy.retry_budget() {
        return vec![Effect::Sleep(Pause::Backoff), Effect::Retry];
    }
    state.reset();
    skip(format!("gave up after {attempts} attempts: {detail}"))
}

fn resolve(resolution: Resolution) -> Vec<Effect> {
    vec![
        Effect::SaveCursor,
        Effect::Sleep(Pause::Pacing),
        Effect::Resolve(resolution),
    ]
}

fn skip(reason: String) -> Vec<Effect> {
    let mut effects = vec![Effect::RecordMissing { reason }];
    effects.extend(resolve(Resolution::Skipped));
    effects
}
