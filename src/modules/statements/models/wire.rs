//! Provider response shapes.
//!
//! The by-document endpoint lists compositions directly on each
//! `mensalidades[]` entry; the by-contract endpoint nests them under
//! `mensalidades[].fatura.fatura`. Field types are loose upstream (codes
//! arrive as numbers or strings, nulls are common), so scalar fields are
//! read leniently.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::statement::{Composition, Statement, StatementInvoice};

/// Response of `GET /Demonstrativo/buscaporperiodocnpj`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyStatementWire {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mensalidades: Vec<CompanyInvoiceWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyInvoiceWire {
    #[serde(flatten)]
    pub header: InvoiceHeaderWire,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub composicoes: Vec<CompositionWire>,
}

/// Response of `GET /Demonstrativo/BuscarPorPeriodoContrato`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractStatementWire {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mensalidades: Vec<ContractInvoiceWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractInvoiceWire {
    #[serde(flatten)]
    pub header: InvoiceHeaderWire,

    #[serde(default)]
    pub fatura: Option<FaturaWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaturaWire {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fatura: Vec<CompositionWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeaderWire {
    #[serde(default, deserialize_with = "lenient_string")]
    pub contrato: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plano: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub abrangencia: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub codigo_fatura: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub valor_fatura: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionWire {
    #[serde(default, deserialize_with = "lenient_string")]
    pub codigo_beneficiario: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nome_beneficiario: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cpf_beneficiario: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub data_nascimento: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub data_inclusao: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dependencia: String,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub idade: Option<i32>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub valor: Decimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub descricao: String,
}

impl InvoiceHeaderWire {
    fn into_invoice(self, compositions: Vec<CompositionWire>) -> StatementInvoice {
        StatementInvoice {
            contract: self.contrato,
            plan: self.plano,
            coverage: self.abrangencia,
            invoice_code: self.codigo_fatura,
            invoice_total: self.valor_fatura,
            compositions: compositions.into_iter().map(Composition::from).collect(),
        }
    }
}

impl From<CompositionWire> for Composition {
    fn from(wire: CompositionWire) -> Self {
        let document = wire.cpf_beneficiario.trim();
        Composition {
            beneficiary_code: wire.codigo_beneficiario,
            beneficiary_name: wire.nome_beneficiario,
            beneficiary_document: (!document.is_empty()).then(|| document.to_string()),
            birth_date: parse_provider_date(&wire.data_nascimento),
            admission_date: parse_provider_date(&wire.data_inclusao),
            dependency: wire.dependencia,
            age: wire.idade,
            amount: wire.valor,
            description: wire.descricao,
        }
    }
}

impl From<CompanyStatementWire> for Statement {
    fn from(wire: CompanyStatementWire) -> Self {
        Statement {
            invoices: wire
                .mensalidades
                .into_iter()
                .map(|m| m.header.into_invoice(m.composicoes))
                .collect(),
        }
    }
}

impl From<ContractStatementWire> for Statement {
    fn from(wire: ContractStatementWire) -> Self {
        Statement {
            invoices: wire
                .mensalidades
                .into_iter()
                .map(|m| {
                    let compositions = m.fatura.map(|f| f.fatura).unwrap_or_default();
                    m.header.into_invoice(compositions)
                })
                .collect(),
        }
    }
}

/// Accepts `dd/mm/yyyy`, `yyyy-mm-dd` and ISO datetimes; anything else is `None`
pub fn parse_provider_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d"))
        .ok()
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.to_string().parse::<Decimal>().or_else(|_| {
            n.as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", n)))
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Decimal::ZERO),
        // Provider sometimes formats amounts with a decimal comma
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse::<Decimal>()
            .map_err(|_| D::Error::custom(format!("invalid amount: {}", s))),
        _ => Ok(Decimal::ZERO),
    }
}
