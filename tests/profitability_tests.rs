//! Unit tests for the profitability evaluator

use intent_solver::service::profitability::{evaluate, ProfitDecision};

/// What is tested: 1_000_000 output at a 1% margin
/// Why: Reference example; owner receives 990_000, solver keeps 10_000
#[test]
fn test_one_percent_margin_example() {
    let decision = evaluate(1_000_000, 1);
    assert_eq!(
        decision,
        ProfitDecision {
            processable: true,
            profitable: true,
            send_amount: 990_000,
        }
    );
}

/// What is tested: zero and negative outputs are processable but not profitable
/// Why: A quote exists but cannot fund a settlement
#[test]
fn test_non_positive_output() {
    for total in [0i128, -1, -1_000_000] {
        let decision = evaluate(total, 1);
        assert!(decision.processable);
        assert!(!decision.profitable);
    }
}

/// What is tested: a zero margin never counts as profitable
/// Why: send == total leaves no profit
#[test]
fn test_zero_margin_is_break_even() {
    let decision = evaluate(1_000_000, 0);
    assert_eq!(decision.send_amount, 1_000_000);
    assert!(!decision.profitable);
}

/// What is tested: send is strictly below total and non-decreasing in total for m > 0
/// Why: The solver must never forward the whole route output
#[test]
fn test_send_amount_monotonic_and_below_total() {
    for margin in [1u8, 5, 50, 99] {
        let mut previous = 0u64;
        for total in (100i128..20_000).step_by(37) {
            let decision = evaluate(total, margin);
            assert!(i128::from(decision.send_amount) < total);
            assert!(decision.send_amount >= previous);
            previous = decision.send_amount;
        }
    }
}

/// What is tested: floor division truncates toward zero
/// Why: Rounding up would overpay the owner
#[test]
fn test_floor_division() {
    // 199 * 99 / 100 = 197.01
    let decision = evaluate(199, 1);
    assert_eq!(decision.send_amount, 197);
    assert!(decision.profitable);
}

/// What is tested: large amounts keep full precision
/// Why: Token amounts routinely exceed f64's exact integer range
#[test]
fn test_large_amount_precision() {
    let total = i128::from(u64::MAX);
    let decision = evaluate(total, 1);
    assert_eq!(u128::from(decision.send_amount), (u64::MAX as u128) * 99 / 100);
    assert!(decision.profitable);
}
