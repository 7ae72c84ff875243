//! Profitability Evaluator
//!
//! Decides how much of a route's output is forwarded to the intent owner and
//! whether the remainder meets the solver's margin.

/// Outcome of a profitability evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitDecision {
    /// A quote existed and was evaluated
    pub processable: bool,
    /// Worth settling
    pub profitable: bool,
    /// Amount of output token forwarded to the owner
    pub send_amount: u64,
}

impl ProfitDecision {
    const UNUSABLE: Self = Self {
        processable: true,
        profitable: false,
        send_amount: 0,
    };
}

/// Evaluates a route output against a minimum margin.
///
/// `send = total * (100 - m) / 100` with floor division, `profit = total - send`.
/// Profitable only when both are positive and `send` fits the instruction's u64.
/// Margins above 100 are clamped to 100.
///
/// # Arguments
///
/// * `total_output` - Route output in the output mint's smallest unit
/// * `min_margin_percent` - Solver margin `m`
pub fn evaluate(total_output: i128, min_margin_percent: u8) -> ProfitDecision {
    if total_output <= 0 {
        return ProfitDecision::UNUSABLE;
    }

    let total = total_output as u128;
    let keep_percent = 100 - u128::from(min_margin_percent.min(100));
    // total <= i128::MAX, so total * 100 cannot overflow u128.
    let send = total * keep_percent / 100;
    let profit = total - send;

    let send_amount = match u64::try_from(send) {
        Ok(amount) => amount,
        Err(_) => return ProfitDecision::UNUSABLE,
    };

    ProfitDecision {
        processable: true,
        profitable: profit > 0 && send_amount > 0,
        send_amount,
    }
}
