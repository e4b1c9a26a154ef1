//! Support tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, SupportTicketId, UserId};

/// A product-support request filed by a customer.
///
/// Write-once: customers file tickets, admins read them back. The billing
/// fields identify the purchase the ticket is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: SupportTicketId,
    pub user_id: UserId,
    pub contact: String,
    pub billing_name: String,
    pub billing_date: DateTime<Utc>,
    pub product_serial_no: String,
    pub product_model_no: String,
    pub issue_type: String,
    pub created_at: DateTime<Utc>,
}

impl SupportTicket {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        contact: impl Into<String>,
        billing_name: impl Into<String>,
        billing_date: DateTime<Utc>,
        product_serial_no: impl Into<String>,
        product_model_no: impl Into<String>,
        issue_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let contact = contact.into();
        let issue_type = issue_type.into();
        if contact.trim().is_empty() {
            return Err(DomainError::invalid_input("contact must not be empty"));
        }
        if issue_type.trim().is_empty() {
            return Err(DomainError::invalid_input("issue type must not be empty"));
        }

        Ok(Self {
            id: SupportTicketId::new(),
            user_id,
            contact,
            billing_name: billing_name.into(),
            billing_date,
            product_serial_no: product_serial_no.into(),
            product_model_no: product_model_no.into(),
            issue_type,
            created_at: now,
        })
    }
}

impl Entity for SupportTicket {
    type Id = SupportTicketId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contact_or_issue_type_is_rejected() {
        let now = Utc::now();
        let err = SupportTicket::new(
            UserId::new(),
            "",
            "Jordan Reyes",
            now,
            "SN-1",
            "MD-1",
            "defect",
            now,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = SupportTicket::new(
            UserId::new(),
            "jordan@example.com",
            "Jordan Reyes",
            now,
            "SN-1",
            "MD-1",
            "  ",
            now,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn ticket_records_the_filing_time() {
        let now = Utc::now();
        let ticket = SupportTicket::new(
            UserId::new(),
            "jordan@example.com",
            "Jordan Reyes",
            now,
            "SN-1",
            "MD-1",
            "no_power",
            now,
        )
        .unwrap();
        assert_eq!(ticket.created_at, now);
    }
}
