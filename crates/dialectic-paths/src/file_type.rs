//! Artifact taxonomy
//!
//! [`FileType`] is the closed vocabulary of artifact kinds the codec knows
//! about. It is partitioned into five [`FileTypeFamily`] groups; only the
//! first four can be turned into a storage path. The fifth,
//! [`FileType::Document`], wraps the semantic [`DocumentKey`] vocabulary
//! and exists for classification only.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Debate-phase tag carried by model contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    /// Initial proposal
    Thesis,
    /// Critique of a specific thesis
    Antithesis,
    /// Synthesis contribution
    Synthesis,
    /// Intermediate synthesis of exactly two sources
    PairwiseSynthesisChunk,
    /// Intermediate reduction of pairwise chunks
    ReducedSynthesis,
    /// Final synthesis output
    FinalSynthesis,
    /// Planning stage output
    Parenthesis,
    /// Finalization stage output
    Paralysis,
}

impl ContributionType {
    /// Every contribution type, in pipeline order.
    pub const ALL: &'static [Self] = &[
        Self::Thesis,
        Self::Antithesis,
        Self::Synthesis,
        Self::PairwiseSynthesisChunk,
        Self::ReducedSynthesis,
        Self::FinalSynthesis,
        Self::Parenthesis,
        Self::Paralysis,
    ];

    /// Wire and filename form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Thesis => "thesis",
            Self::Antithesis => "antithesis",
            Self::Synthesis => "synthesis",
            Self::PairwiseSynthesisChunk => "pairwise_synthesis_chunk",
            Self::ReducedSynthesis => "reduced_synthesis",
            Self::FinalSynthesis => "final_synthesis",
            Self::Parenthesis => "parenthesis",
            Self::Paralysis => "paralysis",
        }
    }

    /// Intermediate synthesis artifacts live in the work directory.
    #[inline]
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        matches!(self, Self::PairwiseSynthesisChunk | Self::ReducedSynthesis)
    }
}

impl Display for ContributionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContributionType {
    type Err = UnknownFileType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFileType(s.to_string()))
    }
}

/// Semantic document keys produced by the debate stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum DocumentKey {
    // thesis
    BusinessCase,
    FeatureSpec,
    TechnicalApproach,
    SuccessMetrics,
    // antithesis
    BusinessCaseCritique,
    TechnicalFeasibilityAssessment,
    RiskRegister,
    NonFunctionalRequirements,
    DependencyMap,
    ComparisonVector,
    // synthesis
    SynthesisPairwiseBusinessCase,
    SynthesisPairwiseFeatureSpec,
    SynthesisPairwiseTechnicalApproach,
    SynthesisPairwiseSuccessMetrics,
    SynthesisDocumentBusinessCase,
    SynthesisDocumentFeatureSpec,
    SynthesisDocumentTechnicalApproach,
    SynthesisDocumentSuccessMetrics,
    Prd,
    SystemArchitectureOverview,
    TechStackRecommendations,
    HeaderContextPairwise,
    SynthesisHeaderContext,
    // parenthesis
    Trd,
    MasterPlan,
    MilestoneSchema,
    // paralysis
    UpdatedMasterPlan,
    ActionableChecklist,
    AdvisorRecommendations,
}

impl DocumentKey {
    /// The full document-key vocabulary.
    pub const ALL: &'static [Self] = &[
        Self::BusinessCase,
        Self::FeatureSpec,
        Self::TechnicalApproach,
        Self::SuccessMetrics,
        Self::BusinessCaseCritique,
        Self::TechnicalFeasibilityAssessment,
        Self::RiskRegister,
        Self::NonFunctionalRequirements,
        Self::DependencyMap,
        Self::ComparisonVector,
        Self::SynthesisPairwiseBusinessCase,
        Self::SynthesisPairwiseFeatureSpec,
        Self::SynthesisPairwiseTechnicalApproach,
        Self::SynthesisPairwiseSuccessMetrics,
        Self::SynthesisDocumentBusinessCase,
        Self::SynthesisDocumentFeatureSpec,
        Self::SynthesisDocumentTechnicalApproach,
        Self::SynthesisDocumentSuccessMetrics,
        Self::Prd,
        Self::SystemArchitectureOverview,
        Self::TechStackRecommendations,
        Self::HeaderContextPairwise,
        Self::SynthesisHeaderContext,
        Self::Trd,
        Self::MasterPlan,
        Self::MilestoneSchema,
        Self::UpdatedMasterPlan,
        Self::ActionableChecklist,
        Self::AdvisorRecommendations,
    ];

    /// Slug used in filenames and on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessCase => "business_case",
            Self::FeatureSpec => "feature_spec",
            Self::TechnicalApproach => "technical_approach",
            Self::SuccessMetrics => "success_metrics",
            Self::BusinessCaseCritique => "business_case_critique",
            Self::TechnicalFeasibilityAssessment => "technical_feasibility_assessment",
            Self::RiskRegister => "risk_register",
            Self::NonFunctionalRequirements => "non_functional_requirements",
            Self::DependencyMap => "dependency_map",
            Self::ComparisonVector => "comparison_vector",
            Self::SynthesisPairwiseBusinessCase => "synthesis_pairwise_business_case",
            Self::SynthesisPairwiseFeatureSpec => "synthesis_pairwise_feature_spec",
            Self::SynthesisPairwiseTechnicalApproach => "synthesis_pairwise_technical_approach",
            Self::SynthesisPairwiseSuccessMetrics => "synthesis_pairwise_success_metrics",
            Self::SynthesisDocumentBusinessCase => "synthesis_document_business_case",
            Self::SynthesisDocumentFeatureSpec => "synthesis_document_feature_spec",
            Self::SynthesisDocumentTechnicalApproach => "synthesis_document_technical_approach",
            Self::SynthesisDocumentSuccessMetrics => "synthesis_document_success_metrics",
            Self::Prd => "prd",
            Self::SystemArchitectureOverview => "system_architecture_overview",
            Self::TechStackRecommendations => "tech_stack_recommendations",
            Self::HeaderContextPairwise => "header_context_pairwise",
            Self::SynthesisHeaderContext => "synthesis_header_context",
            Self::Trd => "trd",
            Self::MasterPlan => "master_plan",
            Self::MilestoneSchema => "milestone_schema",
            Self::UpdatedMasterPlan => "updated_master_plan",
            Self::ActionableChecklist => "actionable_checklist",
            Self::AdvisorRecommendations => "advisor_recommendations",
        }
    }

    /// Debate phase that produces this document.
    ///
    /// Header-context keys are process artifacts and have no phase.
    #[must_use]
    pub const fn contribution_type(&self) -> Option<ContributionType> {
        match self {
            Self::BusinessCase
            | Self::FeatureSpec
            | Self::TechnicalApproach
            | Self::SuccessMetrics => Some(ContributionType::Thesis),
            Self::BusinessCaseCritique
            | Self::TechnicalFeasibilityAssessment
            | Self::RiskRegister
            | Self::NonFunctionalRequirements
            | Self::DependencyMap
            | Self::ComparisonVector => Some(ContributionType::Antithesis),
            Self::SynthesisPairwiseBusinessCase
            | Self::SynthesisPairwiseFeatureSpec
            | Self::SynthesisPairwiseTechnicalApproach
            | Self::SynthesisPairwiseSuccessMetrics
            | Self::SynthesisDocumentBusinessCase
            | Self::SynthesisDocumentFeatureSpec
            | Self::SynthesisDocumentTechnicalApproach
            | Self::SynthesisDocumentSuccessMetrics
            | Self::Prd
            | Self::SystemArchitectureOverview
            | Self::TechStackRecommendations => Some(ContributionType::Synthesis),
            Self::HeaderContextPairwise | Self::SynthesisHeaderContext => None,
            Self::Trd | Self::MasterPlan | Self::MilestoneSchema => {
                Some(ContributionType::Parenthesis)
            }
            Self::UpdatedMasterPlan | Self::ActionableChecklist | Self::AdvisorRecommendations => {
                Some(ContributionType::Paralysis)
            }
        }
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKey {
    type Err = UnknownFileType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownFileType(s.to_string()))
    }
}

/// Coarse partition of [`FileType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTypeFamily {
    /// Files stored directly under the project
    Project,
    /// Singletons stored in a stage directory
    Stage,
    /// Model outputs parameterized by [`ContributionType`]
    ModelContribution,
    /// Prompts, contexts and documents produced around a generation
    DocumentProcess,
    /// Semantic document keys (classification only)
    DocumentKey,
}

/// Closed set of artifact kinds.
///
/// Serializes as its snake_case tag; [`FileType::Document`] serializes as
/// the bare document key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `project_readme.md`
    ProjectReadme,
    /// User prompt uploaded with the project
    InitialUserPrompt,
    /// `project_settings.json`
    ProjectSettingsFile,
    /// User-supplied reference material
    GeneralResource,
    /// Project export archive
    ProjectExportZip,
    /// Draft awaiting work
    PendingFile,
    /// Draft in progress
    CurrentFile,
    /// Finished draft
    CompleteFile,
    /// `Master_Plan.md`
    ProjectMasterPlan,
    /// `seed_prompt.md` of a stage
    SeedPrompt,
    /// `user_feedback_{stage}.md`
    UserFeedback,
    /// User-supplied document attached to a stage
    ContributionDocument,
    /// Markdown body of a model contribution
    ModelContributionMain,
    /// Raw provider response of a model contribution
    ModelContributionRawJson,
    /// Planner prompt sent before document generation
    PlannerPrompt,
    /// Per-document turn prompt
    TurnPrompt,
    /// Shared header context for a generation
    HeaderContext,
    /// Assembled JSON form of a document
    AssembledDocumentJson,
    /// Final rendered markdown document
    RenderedDocument,
    /// Compressed RAG context
    RagContextSummary,
    /// Semantic document key
    Document(DocumentKey),
}

impl FileType {
    /// Every constructible file type (families a–d).
    pub const CONSTRUCTIBLE: &'static [Self] = &[
        Self::ProjectReadme,
        Self::InitialUserPrompt,
        Self::ProjectSettingsFile,
        Self::GeneralResource,
        Self::ProjectExportZip,
        Self::PendingFile,
        Self::CurrentFile,
        Self::CompleteFile,
        Self::ProjectMasterPlan,
        Self::SeedPrompt,
        Self::UserFeedback,
        Self::ContributionDocument,
        Self::ModelContributionMain,
        Self::ModelContributionRawJson,
        Self::PlannerPrompt,
        Self::TurnPrompt,
        Self::HeaderContext,
        Self::AssembledDocumentJson,
        Self::RenderedDocument,
        Self::RagContextSummary,
    ];

    /// Snake_case tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectReadme => "project_readme",
            Self::InitialUserPrompt => "initial_user_prompt",
            Self::ProjectSettingsFile => "project_settings_file",
            Self::GeneralResource => "general_resource",
            Self::ProjectExportZip => "project_export_zip",
            Self::PendingFile => "pending_file",
            Self::CurrentFile => "current_file",
            Self::CompleteFile => "complete_file",
            Self::ProjectMasterPlan => "project_master_plan",
            Self::SeedPrompt => "seed_prompt",
            Self::UserFeedback => "user_feedback",
            Self::ContributionDocument => "contribution_document",
            Self::ModelContributionMain => "model_contribution_main",
            Self::ModelContributionRawJson => "model_contribution_raw_json",
            Self::PlannerPrompt => "planner_prompt",
            Self::TurnPrompt => "turn_prompt",
            Self::HeaderContext => "header_context",
            Self::AssembledDocumentJson => "assembled_document_json",
            Self::RenderedDocument => "rendered_document",
            Self::RagContextSummary => "rag_context_summary",
            Self::Document(key) => key.as_str(),
        }
    }

    /// Family this file type belongs to.
    #[must_use]
    pub const fn family(&self) -> FileTypeFamily {
        match self {
            Self::ProjectReadme
            | Self::InitialUserPrompt
            | Self::ProjectSettingsFile
            | Self::GeneralResource
            | Self::ProjectExportZip
            | Self::PendingFile
            | Self::CurrentFile
            | Self::CompleteFile
            | Self::ProjectMasterPlan => FileTypeFamily::Project,
            Self::SeedPrompt | Self::UserFeedback | Self::ContributionDocument => {
                FileTypeFamily::Stage
            }
            Self::ModelContributionMain | Self::ModelContributionRawJson => {
                FileTypeFamily::ModelContribution
            }
            Self::PlannerPrompt
            | Self::TurnPrompt
            | Self::HeaderContext
            | Self::AssembledDocumentJson
            | Self::RenderedDocument
            | Self::RagContextSummary => FileTypeFamily::DocumentProcess,
            Self::Document(_) => FileTypeFamily::DocumentKey,
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = UnknownFileType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(file_type) = Self::CONSTRUCTIBLE.iter().copied().find(|t| t.as_str() == s) {
            return Ok(file_type);
        }
        s.parse::<DocumentKey>().map(Self::Document)
    }
}

impl Serialize for FileType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Map a file type to the debate phase it belongs to.
///
/// Total over [`FileType`]. Document keys resolve to their phase; process
/// artifacts, singletons and the generic model-contribution types (whose
/// phase lives in the context, not the file type) return `None`.
#[must_use]
pub const fn contribution_type_from_file_type(file_type: FileType) -> Option<ContributionType> {
    match file_type {
        FileType::Document(key) => key.contribution_type(),
        FileType::ProjectReadme
        | FileType::InitialUserPrompt
        | FileType::ProjectSettingsFile
        | FileType::GeneralResource
        | FileType::ProjectExportZip
        | FileType::PendingFile
        | FileType::CurrentFile
        | FileType::CompleteFile
        | FileType::ProjectMasterPlan
        | FileType::SeedPrompt
        | FileType::UserFeedback
        | FileType::ContributionDocument
        | FileType::ModelContributionMain
        | FileType::ModelContributionRawJson
        | FileType::PlannerPrompt
        | FileType::TurnPrompt
        | FileType::HeaderContext
        | FileType::AssembledDocumentJson
        | FileType::RenderedDocument
        | FileType::RagContextSummary => None,
    }
}

/// Whether `anchor` is a known anchor type: a contribution type or a
/// document key.
#[must_use]
pub fn is_known_anchor(anchor: &str) -> bool {
    ContributionType::ALL.iter().any(|t| t.as_str() == anchor)
        || DocumentKey::ALL.iter().any(|k| k.as_str() == anchor)
}

/// Unrecognized file type, contribution type or document key tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type: '{0}'")]
pub struct UnknownFileType(pub String);
