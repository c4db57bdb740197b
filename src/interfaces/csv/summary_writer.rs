use crate::domain::payment::Payment;
use crate::error::Result;
use std::io::Write;

/// Writes the final state of all payments as CSV.
///
/// Rows are sorted by creation time (id as tie-break) so output is
/// deterministic across runs.
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().from_writer(target),
        }
    }

    pub fn write_payments(&mut self, mut payments: Vec<Payment>) -> Result<()> {
        payments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        self.writer.write_record([
            "payment_id",
            "status",
            "amount",
            "currency",
            "creation_key",
            "applied_events",
        ])?;
        for payment in payments {
            self.writer.write_record([
                payment.id.as_str(),
                payment.status.as_str(),
                &payment.amount.to_string(),
                payment.currency.as_str(),
                payment.creation_key.as_str(),
                &payment.applied_event_count.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{
        Amount, Currency, CustomerDetails, IdempotencyKey, PaymentDraft, PaymentId, PaymentMethod,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_layout() {
        let draft = PaymentDraft {
            amount: Amount::new(dec!(50000)).unwrap(),
            currency: Currency::new("COP").unwrap(),
            payment_method: PaymentMethod::Pse,
            bank: None,
            customer: CustomerDetails::new("ana@example.com", "Ana", "CC-123").unwrap(),
            redirect_url: "https://merchant.example.com/return".to_string(),
        };
        let payment = Payment::new(
            PaymentId::new("pay_0123456789abcdef"),
            draft,
            IdempotencyKey::new("k1").unwrap(),
            Utc::now(),
            8,
        );

        let mut buffer = Vec::new();
        SummaryWriter::new(&mut buffer)
            .write_payments(vec![payment])
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("payment_id,status,amount,currency,creation_key,applied_events")
        );
        assert_eq!(
            lines.next(),
            Some("pay_0123456789abcdef,pending,50000,COP,k1,0")
        );
    }
}
