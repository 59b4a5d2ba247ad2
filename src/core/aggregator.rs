use crate::domain::model::{ClassificationResult, LineItem, Savings, SavingsSummary};

/// Sums item prices. Prices that are not finite and non-negative contribute 0.
pub fn sum(items: &[LineItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price)
        .filter(|price| price.is_finite() && *price >= 0.0)
        .sum()
}

pub fn summarize(essentials_total: f64, non_essentials_total: f64) -> SavingsSummary {
    let total = essentials_total + non_essentials_total;
    let remove_all = non_essentials_total;
    let halve = non_essentials_total / 2.0;

    let savings = (total > 0.0).then(|| Savings {
        remove_all,
        remove_all_percent: remove_all / total * 100.0,
        halve,
        halve_percent: halve / total * 100.0,
    });

    SavingsSummary {
        essentials_total,
        non_essentials_total,
        total,
        savings,
    }
}

pub fn analyze(result: &ClassificationResult) -> SavingsSummary {
    summarize(sum(&result.essentials), sum(&result.non_essentials))
}
