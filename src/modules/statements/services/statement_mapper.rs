use crate::core::text::transliterate_upper;
use crate::core::Period;
use crate::modules::billing::models::{BillingRow, ImportSource};
use crate::modules::statements::models::{Composition, Statement, StatementInvoice};
use crate::modules::subscribers::CompanyKey;

/// Flattens a statement into billing rows
pub struct StatementMapper;

impl StatementMapper {
    /// One row per composition, invoices in order. Invoice fields are copied
    /// onto each of its rows; an empty statement yields no rows.
    pub fn flatten(
        statement: &Statement,
        company: &CompanyKey,
        import_period: Period,
        source: &ImportSource,
    ) -> Vec<BillingRow> {
        let reference_period = import_period.reference_period();

        statement
            .invoices
            .iter()
            .flat_map(|invoice| {
                invoice.compositions.iter().map(move |composition| {
                    Self::row(
                        invoice,
                        composition,
                        company,
                        source,
                        import_period,
                        reference_period,
                    )
                })
            })
            .collect()
    }

    fn row(
        invoice: &StatementInvoice,
        composition: &Composition,
        company: &CompanyKey,
        source: &ImportSource,
        import_period: Period,
        reference_period: Period,
    ) -> BillingRow {
        let dependency = composition.dependency.trim();

        BillingRow {
            company: company.clone(),
            source: source.clone(),
            contract: invoice.contract.clone(),
            plan: invoice.plan.clone(),
            coverage: invoice.coverage.clone(),
            invoice_code: invoice.invoice_code.clone(),
            invoice_total: invoice.invoice_total,
            beneficiary_code: composition.beneficiary_code.clone(),
            beneficiary_name: composition.beneficiary_name.clone(),
            beneficiary_document: composition.beneficiary_document.clone(),
            birth_date: composition.birth_date,
            admission_date: composition.admission_date,
            holder_code: (!dependency.is_empty()).then(|| dependency.to_string()),
            age: composition.age,
            amount: composition.amount,
            description: transliterate_upper(&composition.description),
            import_period,
            reference_period,
        }
    }
}
