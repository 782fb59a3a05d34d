//! Display utilities for the CLI

use colored::*;
use rust_decimal::Decimal;

use tenantpay_ledger::{Balance, Page, StatusSummary};
use tenantpay_types::{WithdrawalRequest, WithdrawalStatus};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

/// Format an amount with its currency, two decimal places
pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{} {}", currency, amount.round_dp(2))
}

fn status_label(status: WithdrawalStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        WithdrawalStatus::Pending => label.yellow(),
        WithdrawalStatus::Approved => label.bright_blue(),
        WithdrawalStatus::Processed | WithdrawalStatus::Completed => label.bright_green(),
        WithdrawalStatus::Rejected | WithdrawalStatus::Failed => label.bright_red(),
    }
}

pub fn balance(balance: &Balance, currency: &str) {
    labeled("Net earned", &money(balance.total_net_earned, currency));
    labeled("Withdrawn", &money(balance.total_withdrawn, currency));
    labeled("Pending", &money(balance.total_pending, currency));
    println!(
        "  {}: {}",
        "Available".bright_white().bold(),
        money(balance.remaining_net_earned, currency).bright_green().bold()
    );
}

pub fn withdrawal(request: &WithdrawalRequest, currency: &str) {
    labeled("ID", &request.id.to_string());
    labeled("Tenant", &request.tenant_id.to_string());
    labeled("Amount", &money(request.amount, currency));
    println!("  {}: {}", "Status".bright_white(), status_label(request.status));
    labeled("Type", request.kind.as_str());
    labeled("Method", request.payment_method.as_str());
    if let Some(notes) = &request.tenant_notes {
        labeled("Tenant notes", notes);
    }
    if let Some(by) = request.processed_by {
        labeled("Processed by", &by.to_string());
    }
    if let Some(at) = request.processed_at {
        labeled("Processed at", &at.to_rfc3339());
    }
    if let Some(notes) = &request.processing_notes {
        labeled("Processing notes", notes);
    }
    if let Some(reference) = &request.external_reference {
        labeled("Reference", reference);
    }
}

/// One line per request
pub fn withdrawal_rows(requests: &[WithdrawalRequest], currency: &str) {
    if requests.is_empty() {
        println!("  {}", "No withdrawal requests".yellow());
        return;
    }
    for request in requests {
        println!(
            "  {} {:<12} {:>16}  {:<8} {}",
            "●".bright_cyan(),
            status_label(request.status),
            money(request.amount, currency).bright_white(),
            request.kind.as_str(),
            request.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
        );
        println!("      {}", request.id.to_string().bright_black());
    }
}

pub fn page_footer<T>(page: &Page<T>) {
    println!();
    println!(
        "  {}",
        format!("Page {} of {} ({} total)", page.page, page.pages.max(1), page.total).bright_black()
    );
}

pub fn status_table(summaries: &[StatusSummary], currency: &str) {
    for summary in summaries {
        println!(
            "  {:<12} {:>6}  {:>16}",
            status_label(summary.status),
            summary.count,
            money(summary.amount, currency)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_to_cents() {
        assert_eq!(money(dec!(971.000), "INR"), "INR 971.00");
        assert_eq!(money(dec!(12.345), "USD"), "USD 12.34");
    }
}
