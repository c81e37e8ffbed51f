//! Canonical bid schema and the field map types that flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name → value. Sparse until validation.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// One of the 20 canonical bid fields, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BidField {
    BidNumber,
    Title,
    DueDate,
    BidSubmissionType,
    TermOfBid,
    PreBidMeeting,
    Installation,
    BidBondRequirement,
    DeliveryDate,
    PaymentTerms,
    AdditionalDocumentation,
    MfgForRegistration,
    ContractOrCooperative,
    ModelNo,
    PartNo,
    Product,
    ContactInfo,
    CompanyName,
    BidSummary,
    ProductSpecification,
}

impl BidField {
    pub const ALL: [BidField; 20] = [
        BidField::BidNumber,
        BidField::Title,
        BidField::DueDate,
        BidField::BidSubmissionType,
        BidField::TermOfBid,
        BidField::PreBidMeeting,
        BidField::Installation,
        BidField::BidBondRequirement,
        BidField::DeliveryDate,
        BidField::PaymentTerms,
        BidField::AdditionalDocumentation,
        BidField::MfgForRegistration,
        BidField::ContractOrCooperative,
        BidField::ModelNo,
        BidField::PartNo,
        BidField::Product,
        BidField::ContactInfo,
        BidField::CompanyName,
        BidField::BidSummary,
        BidField::ProductSpecification,
    ];

    /// Human-readable label used by rules, the oracle and merged maps.
    pub fn label(self) -> &'static str {
        match self {
            BidField::BidNumber => "Bid Number",
            BidField::Title => "Title",
            BidField::DueDate => "Due Date",
            BidField::BidSubmissionType => "Bid Submission Type",
            BidField::TermOfBid => "Term of Bid",
            BidField::PreBidMeeting => "Pre Bid Meeting",
            BidField::Installation => "Installation",
            BidField::BidBondRequirement => "Bid Bond Requirement",
            BidField::DeliveryDate => "Delivery Date",
            BidField::PaymentTerms => "Payment Terms",
            BidField::AdditionalDocumentation => "Any Additional Documentation Required",
            BidField::MfgForRegistration => "MFG for Registration",
            BidField::ContractOrCooperative => "Contract or Cooperative to use",
            BidField::ModelNo => "Model_no",
            BidField::PartNo => "Part_no",
            BidField::Product => "Product",
            BidField::ContactInfo => "contact_info",
            BidField::CompanyName => "company_name",
            BidField::BidSummary => "Bid Summary",
            BidField::ProductSpecification => "Product Specification",
        }
    }

    /// Identifier used in the serialized record.
    pub fn key(self) -> &'static str {
        match self {
            BidField::BidNumber => "Bid_Number",
            BidField::Title => "Title",
            BidField::DueDate => "Due_Date",
            BidField::BidSubmissionType => "Bid_Submission_Type",
            BidField::TermOfBid => "Term_of_Bid",
            BidField::PreBidMeeting => "Pre_Bid_Meeting",
            BidField::Installation => "Installation",
            BidField::BidBondRequirement => "Bid_Bond_Requirement",
            BidField::DeliveryDate => "Delivery_Date",
            BidField::PaymentTerms => "Payment_Terms",
            BidField::AdditionalDocumentation => "Additional_Documentation_Required",
            BidField::MfgForRegistration => "MFG_for_Registration",
            BidField::ContractOrCooperative => "Contract_or_Cooperative_to_use",
            BidField::ModelNo => "Model_no",
            BidField::PartNo => "Part_no",
            BidField::Product => "Product",
            BidField::ContactInfo => "Contact_Info",
            BidField::CompanyName => "Company_Name",
            BidField::BidSummary => "Bid_Summary",
            BidField::ProductSpecification => "Product_Specification",
        }
    }

    /// Resolve a label or identifier, ignoring case, spaces and underscores.
    pub fn from_key(name: &str) -> Option<Self> {
        let wanted = fold(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|f| fold(f.label()) == wanted || fold(f.key()) == wanted)
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A field value: absent-but-reported, scalar, or multi-valued after merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Null, blank text and lists with no non-blank element carry no information.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Individual values, in order.
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Null => Vec::new(),
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Collapse to a single string, joining list values with ", ".
    pub fn flatten(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::List(items) if items.is_empty() => None,
            FieldValue::List(items) => Some(items.join(", ")),
        }
    }
}

/// A map holding every canonical label with a null value.
pub fn null_field_map() -> FieldMap {
    BidField::ALL
        .iter()
        .map(|f| (f.label().to_string(), FieldValue::Null))
        .collect()
}

/// Final serialized record for one bid group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    #[serde(rename = "Bid_Number")]
    pub bid_number: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Due_Date")]
    pub due_date: Option<String>,
    #[serde(rename = "Bid_Submission_Type")]
    pub bid_submission_type: Option<String>,
    #[serde(rename = "Term_of_Bid")]
    pub term_of_bid: Option<String>,
    #[serde(rename = "Pre_Bid_Meeting")]
    pub pre_bid_meeting: Option<String>,
    #[serde(rename = "Installation")]
    pub installation: Option<String>,
    #[serde(rename = "Bid_Bond_Requirement")]
    pub bid_bond_requirement: Option<String>,
    #[serde(rename = "Delivery_Date")]
    pub delivery_date: Option<String>,
    #[serde(rename = "Payment_Terms")]
    pub payment_terms: Option<String>,
    #[serde(rename = "Additional_Documentation_Required")]
    pub additional_documentation_required: Option<String>,
    #[serde(rename = "MFG_for_Registration")]
    pub mfg_for_registration: Option<String>,
    #[serde(rename = "Contract_or_Cooperative_to_use")]
    pub contract_or_cooperative_to_use: Option<String>,
    #[serde(rename = "Model_no")]
    pub model_no: Option<String>,
    #[serde(rename = "Part_no")]
    pub part_no: Option<String>,
    #[serde(rename = "Product")]
    pub product: Option<String>,
    #[serde(rename = "Contact_Info")]
    pub contact_info: Option<String>,
    #[serde(rename = "Company_Name")]
    pub company_name: Option<String>,
    #[serde(rename = "Bid_Summary")]
    pub bid_summary: Option<String>,
    #[serde(rename = "Product_Specification")]
    pub product_specification: Option<String>,
    /// Keys the canonical schema does not recognize.
    #[serde(rename = "Additional_Metadata")]
    pub additional_metadata: Option<BTreeMap<String, String>>,
}

impl BidRecord {
    pub fn get(&self, field: BidField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    fn slot(&self, field: BidField) -> &Option<String> {
        match field {
            BidField::BidNumber => &self.bid_number,
            BidField::Title => &self.title,
            BidField::DueDate => &self.due_date,
            BidField::BidSubmissionType => &self.bid_submission_type,
            BidField::TermOfBid => &self.term_of_bid,
            BidField::PreBidMeeting => &self.pre_bid_meeting,
            BidField::Installation => &self.installation,
            BidField::BidBondRequirement => &self.bid_bond_requirement,
            BidField::DeliveryDate => &self.delivery_date,
            BidField::PaymentTerms => &self.payment_terms,
            BidField::AdditionalDocumentation => &self.additional_documentation_required,
            BidField::MfgForRegistration => &self.mfg_for_registration,
            BidField::ContractOrCooperative => &self.contract_or_cooperative_to_use,
            BidField::ModelNo => &self.model_no,
            BidField::PartNo => &self.part_no,
            BidField::Product => &self.product,
            BidField::ContactInfo => &self.contact_info,
            BidField::CompanyName => &self.company_name,
            BidField::BidSummary => &self.bid_summary,
            BidField::ProductSpecification => &self.product_specification,
        }
    }

    pub fn slot_mut(&mut self, field: BidField) -> &mut Option<String> {
        match field {
            BidField::BidNumber => &mut self.bid_number,
            BidField::Title => &mut self.title,
            BidField::DueDate => &mut self.due_date,
            BidField::BidSubmissionType => &mut self.bid_submission_type,
            BidField::TermOfBid => &mut self.term_of_bid,
            BidField::PreBidMeeting => &mut self.pre_bid_meeting,
            BidField::Installation => &mut self.installation,
            BidField::BidBondRequirement => &mut self.bid_bond_requirement,
            BidField::DeliveryDate => &mut self.delivery_date,
            BidField::PaymentTerms => &mut self.payment_terms,
            BidField::AdditionalDocumentation => &mut self.additional_documentation_required,
            BidField::MfgForRegistration => &mut self.mfg_for_registration,
            BidField::ContractOrCooperative => &mut self.contract_or_cooperative_to_use,
            BidField::ModelNo => &mut self.model_no,
            BidField::PartNo => &mut self.part_no,
            BidField::Product => &mut self.product,
            BidField::ContactInfo => &mut self.contact_info,
            BidField::CompanyName => &mut self.company_name,
            BidField::BidSummary => &mut self.bid_summary,
            BidField::ProductSpecification => &mut self.product_specification,
        }
    }
}
