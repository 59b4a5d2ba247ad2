use crate::domain::model::{Analysis, LineItem, ReceiptAnalysis};
use crate::utils::error::{Result, SaverError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub currency: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            currency: "Rs.".to_string(),
        }
    }
}

pub fn render_analysis(analysis: &Analysis, options: &ReportOptions) -> Result<String> {
    match options.format {
        ReportFormat::Text => Ok(render_text(analysis, &options.currency)),
        ReportFormat::Csv => render_csv(analysis),
    }
}

pub fn render_receipt(receipt: &ReceiptAnalysis, options: &ReportOptions) -> Result<String> {
    if options.format == ReportFormat::Csv {
        return match &receipt.analysis {
            Some(analysis) => render_csv(analysis),
            None => Ok(String::new()),
        };
    }

    let mut out = String::new();
    section(&mut out, "Extracted Text");
    if receipt.transcript.is_empty() {
        out.push_str("No text found on this receipt.\n");
    } else {
        for line in &receipt.transcript.lines {
            out.push_str(&format!("  {}\n", line));
        }
    }

    if let Some(normalized) = &receipt.normalized {
        out.push('\n');
        section(&mut out, "Preprocessed Text");
        for line in normalized.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    if let Some(analysis) = &receipt.analysis {
        out.push('\n');
        out.push_str(&render_text(analysis, &options.currency));
    }

    Ok(out)
}

fn render_text(analysis: &Analysis, currency: &str) -> String {
    let summary = &analysis.summary;
    let mut out = String::new();

    section(&mut out, "Summary");
    out.push_str(&format!(
        "  Total Spent:    {currency}{:.2}\n  Essentials:     {currency}{:.2}\n  Non-Essentials: {currency}{:.2}\n",
        summary.total, summary.essentials_total, summary.non_essentials_total
    ));

    if let Some(savings) = &summary.savings {
        out.push('\n');
        section(&mut out, "Potential Savings");
        out.push_str(&format!(
            "  Remove all non-essentials:    save {}{:.2} ({:.1}%)\n",
            currency, savings.remove_all, savings.remove_all_percent
        ));
        out.push_str(&format!(
            "  Reduce non-essentials by 50%: save {}{:.2} ({:.1}%)\n",
            currency, savings.halve, savings.halve_percent
        ));
    }

    let suggestions = &analysis.classification.suggestions;
    if !suggestions.is_empty() {
        out.push('\n');
        section(&mut out, "Suggestions");
        for suggestion in suggestions {
            out.push_str(&format!("  - {}\n", suggestion));
        }
    }

    out.push('\n');
    section(&mut out, "Essentials");
    item_table(&mut out, &analysis.classification.essentials, currency);

    out.push('\n');
    section(&mut out, "Non-Essentials");
    item_table(&mut out, &analysis.classification.non_essentials, currency);

    out
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("{}\n{}\n", title, "-".repeat(title.len())));
}

fn item_table(out: &mut String, items: &[LineItem], currency: &str) {
    if items.is_empty() {
        out.push_str("  (none)\n");
        return;
    }

    let name_width = items
        .iter()
        .map(|item| item.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Item".len());

    out.push_str(&format!(
        "  {:<name_width$}  {:>8}  {:>12}\n",
        "Item", "Quantity", "Price"
    ));
    for item in items {
        out.push_str(&format!(
            "  {:<name_width$}  {:>8}  {:>12}\n",
            item.name,
            format_quantity(item.quantity),
            format!("{}{:.2}", currency, item.price)
        ));
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

/// One row per item: `category,item,quantity,price`.
fn render_csv(analysis: &Analysis) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_error = |e: csv::Error| SaverError::Unexpected {
        message: format!("cannot write CSV report: {}", e),
    };

    writer
        .write_record(["category", "item", "quantity", "price"])
        .map_err(csv_error)?;

    let classification = &analysis.classification;
    let rows = classification
        .essentials
        .iter()
        .map(|item| ("essential", item))
        .chain(
            classification
                .non_essentials
                .iter()
                .map(|item| ("non_essential", item)),
        );

    for (category, item) in rows {
        writer
            .write_record([
                category.to_string(),
                item.name.clone(),
                format_quantity(item.quantity),
                format!("{:.2}", item.price),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| SaverError::Unexpected {
        message: format!("cannot flush CSV report: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| SaverError::Unexpected {
        message: format!("CSV report is not UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator;
    use crate::domain::model::{ClassificationResult, Transcript};

    fn milk_and_chips() -> Analysis {
        let classification = ClassificationResult {
            essentials: vec![LineItem::new("Milk", 1.0, 3.0)],
            non_essentials: vec![LineItem::new("Chips, salted", 2.0, 4.0)],
            suggestions: vec!["Buy chips on sale".to_string()],
        };
        let summary = aggregator::analyze(&classification);
        Analysis {
            classification,
            summary,
        }
    }

    #[test]
    fn test_text_report_contains_totals_and_savings() {
        let report = render_analysis(&milk_and_chips(), &ReportOptions::default()).unwrap();

        assert!(report.contains("Total Spent:    Rs.7.00"));
        assert!(report.contains("Essentials:     Rs.3.00"));
        assert!(report.contains("Non-Essentials: Rs.4.00"));
        assert!(report.contains("save Rs.4.00 (57.1%)"));
        assert!(report.contains("save Rs.2.00 (28.6%)"));
        assert!(report.contains("  - Buy chips on sale"));
        assert!(report.contains("Milk"));
    }

    #[test]
    fn test_text_report_without_spending_has_no_savings() {
        let analysis = Analysis {
            classification: ClassificationResult::default(),
            summary: aggregator::summarize(0.0, 0.0),
        };
        let report = render_analysis(&analysis, &ReportOptions::default()).unwrap();

        assert!(report.contains("Total Spent:    Rs.0.00"));
        assert!(!report.contains("Potential Savings"));
        assert!(!report.contains("Suggestions"));
        assert!(report.contains("(none)"));
    }

    #[test]
    fn test_csv_report_quotes_fields() {
        let options = ReportOptions {
            format: ReportFormat::Csv,
            ..ReportOptions::default()
        };
        let report = render_analysis(&milk_and_chips(), &options).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(
            lines,
            vec![
                "category,item,quantity,price",
                "essential,Milk,1,3.00",
                "non_essential,\"Chips, salted\",2,4.00",
            ]
        );
    }

    #[test]
    fn test_receipt_report_with_empty_transcript() {
        let receipt = ReceiptAnalysis {
            transcript: Transcript::default(),
            normalized: None,
            analysis: None,
        };
        let report = render_receipt(&receipt, &ReportOptions::default()).unwrap();

        assert!(report.contains("No text found on this receipt."));
        assert!(!report.contains("Summary"));
    }

    #[test]
    fn test_receipt_report_shows_every_stage() {
        let receipt = ReceiptAnalysis {
            transcript: Transcript {
                lines: vec!["MILK 3.00".to_string(), "CHIPS 4.00".to_string()],
                attempts: 1,
            },
            normalized: Some("Milk - 1 - 3\nChips - 1 - 4".to_string()),
            analysis: Some(milk_and_chips()),
        };
        let report = render_receipt(&receipt, &ReportOptions::default()).unwrap();

        let extracted = report.find("Extracted Text").unwrap();
        let preprocessed = report.find("Preprocessed Text").unwrap();
        let summary = report.find("Summary").unwrap();
        assert!(extracted < preprocessed && preprocessed < summary);
        assert!(report.contains("  CHIPS 4.00"));
    }

    #[test]
    fn test_sections_are_underlined_and_table_aligned() {
        let report = render_analysis(&milk_and_chips(), &ReportOptions::default()).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        let summary = lines.iter().position(|l| *l == "Summary").unwrap();
        assert_eq!(lines[summary + 1], "-------");
        assert_eq!(lines[summary + 2], "  Total Spent:    Rs.7.00");

        let essentials = lines.iter().position(|l| *l == "Essentials").unwrap();
        assert_eq!(lines[essentials + 2], "  Item  Quantity         Price");
        assert_eq!(lines[essentials + 3], "  Milk         1       Rs.3.00");
        assert!(report.ends_with('\n'));
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(1.5), "1.5");
    }
}
