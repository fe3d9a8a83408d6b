use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{ApplicationStatus, Money};

/// Thousands-separated amount; decimals only when there is a fraction
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let rounded = (amount * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if cents == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, cents)
    }
}

/// Money as `"<CUR> <amount>"`, `N/A` when missing
pub fn format_money(money: Option<&Money>) -> String {
    money.map(|m| m.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Status colored for terminal output
pub fn format_status(status: ApplicationStatus) -> String {
    match status {
        ApplicationStatus::Pending => status.as_str().yellow().to_string(),
        ApplicationStatus::Approved => status.as_str().green().to_string(),
        ApplicationStatus::Rejected => status.as_str().red().to_string(),
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read one trimmed line after showing `label`
pub fn prompt(label: &str) -> std::io::Result<String> {
    use std::io::{self, Write};

    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns, padded by display width
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        let cell = truncate(col, *width);
        let pad = width.saturating_sub(cell.width());
        row.push_str(&cell);
        row.push_str(&" ".repeat(pad + 2));
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(5000.0), "5,000");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(-2500.0), "-2,500");
        assert_eq!(format_amount(999.0), "999");
    }

    #[test]
    fn test_format_money_missing() {
        assert_eq!(format_money(None), "N/A");
        assert_eq!(
            format_money(Some(&Money::new(5000.0, Currency::KES))),
            "KES 5,000"
        );
    }

    #[test]
    fn test_truncate_by_display_width() {
        assert_eq!(truncate("Nairobi", 10), "Nairobi");
        assert_eq!(truncate("University of Nairobi", 8), "Univers…");
        assert_eq!(truncate("abc", 0), "");
    }
}
