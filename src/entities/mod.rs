// Entity Models
// Logical records shared by the store, the loaders and the report

pub mod candidate;
pub mod committee;
pub mod company;
pub mod contribution;
pub mod expenditure;
pub mod link;

pub use candidate::Candidate;
pub use committee::{designation_description, type_description, Committee, PAC_TYPE_CODES};
pub use company::{Company, HIGH_RELEVANCE};
pub use contribution::{CommitteeContribution, IndividualTransaction, INDIVIDUAL_ENTITY_TYPE};
pub use expenditure::{IndependentExpenditure, SupportOppose};
pub use link::CandidateCommitteeLink;
