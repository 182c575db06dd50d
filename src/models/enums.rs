use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DocumentType {
    Dd214 => "dd214",
    VaForm526ez => "va_form_526ez",
    Dbq => "dbq",
    NexusLetter => "nexus_letter",
    BuddyStatement => "buddy_statement",
    MedicalRecord => "medical_record",
    ServiceTreatmentRecord => "service_treatment_record",
    RatingDecision => "rating_decision",
    CpExam => "cp_exam",
    Other => "other",
});

str_enum!(DocumentFormat {
    Pdf => "pdf",
    Docx => "docx",
    PlainText => "txt",
    Image => "image",
});

str_enum!(ProcessingStatus {
    Queued => "queued",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

str_enum!(Relevance {
    Direct => "direct",
    Supporting => "supporting",
    Contradictory => "contradictory",
    Neutral => "neutral",
});

str_enum!(EvidenceType {
    ServiceRecord => "service_record",
    MedicalRecord => "medical_record",
    LayStatement => "lay_statement",
    NexusLetter => "nexus_letter",
    CpExam => "cp_exam",
    Other => "other",
});

str_enum!(ClaimType {
    Initial => "initial",
    Increase => "increase",
    Secondary => "secondary",
    Ptsd => "ptsd",
});

impl DocumentType {
    /// Evidence category contributed by fragments of this document type.
    pub fn evidence_type(&self) -> EvidenceType {
        match self {
            Self::Dd214 => EvidenceType::ServiceRecord,
            Self::MedicalRecord | Self::ServiceTreatmentRecord => EvidenceType::MedicalRecord,
            Self::BuddyStatement => EvidenceType::LayStatement,
            Self::NexusLetter => EvidenceType::NexusLetter,
            Self::Dbq | Self::CpExam => EvidenceType::CpExam,
            Self::VaForm526ez | Self::RatingDecision | Self::Other => EvidenceType::Other,
        }
    }
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl Relevance {
    /// Base evidence confidence before phrase bonuses.
    pub fn base_confidence(&self) -> f32 {
        match self {
            Self::Direct => 0.8,
            Self::Contradictory => 0.7,
            Self::Supporting => 0.5,
            Self::Neutral => 0.1,
        }
    }
}
