// Open Pockets - Core Library
// Candidate name resolution, committee linkage and money reports over FEC bulk data.
// Exposes all modules for use in the CLI, the API server, and tests

pub mod error;
pub mod config;
pub mod db;
pub mod ingest;
pub mod entities;
pub mod names;          // Name variants for lookup
pub mod resolver;       // Free text → candidate id
pub mod linker;         // Candidate id → committees
pub mod industry;       // Keyword industry buckets
pub mod contributions;  // Contributor totals and industry breakdown
pub mod classifier;     // PAC categories
pub mod report;         // Per-candidate money report
pub mod summary;        // LLM narrative with local fallback
pub mod remote;         // OpenFEC, LittleSis, chat completion clients

// Re-export commonly used types
pub use error::{FinanceError, Result};
pub use config::{Config, ConfigBuilder, DisambiguationMode, FecConfig, LlmConfig};
pub use db::{open_in_memory_store, open_store, setup_database, CandidateSource, IngestRun};
pub use ingest::{run_manifest, ImportManifest, IngestReport, ManifestEntry, SourceKind};
pub use entities::{
    Candidate, CandidateCommitteeLink, Committee, CommitteeContribution, Company,
    IndependentExpenditure, IndividualTransaction, SupportOppose,
};
pub use names::{NameNormalizer, NameVariants};
pub use resolver::{
    CandidateResolver, CandidateSelector, CandidateTable, Confidence, DisambiguationPolicy,
    MatchStrategy, Resolution, ResolvedBy,
};
pub use linker::{CommitteeConnection, CommitteeDetails, ConnectedCommittee, LinkSource, LinkedCommittee, RecordLinker};
pub use industry::{Industry, IndustryClassifier, IndustryRule};
pub use contributions::{
    ContributingPac, ContributionAggregator, ContributionTotals, ContributorMap, ContributorSummary,
    IndustryTotal, TopContributor,
};
pub use classifier::{PacCategory, PacClassifier};
pub use report::{render_text, Report, ReportAssembler};
pub use summary::{summarize, Summary, SummaryInput, SummarySource};
pub use remote::{
    CandidateRegistry, ChatCompletionClient, EntityLookup, EntityRecord, FecClient, LittleSisClient,
    RegistryCandidate, TextGenerator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
