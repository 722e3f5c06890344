mod dashboard;
mod feature;
mod knowledge;
mod page;
mod partner;
mod people;
mod reminder;
mod user;

pub use dashboard::{
    DashboardStats, FeatureCounts, KnowledgeCounts, PartnerCounts, RecentPartner,
    DASHBOARD_LIST_LIMIT,
};
pub use feature::{Feature, FeatureCategory, FeatureInput, FeatureQuery};
pub use knowledge::{KnowledgeNote, NoteInput, NoteQuery, PinnedNoteSummary};
pub use page::{Page, PageMeta, PageRequest, SortOrder, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use partner::{
    ApprovalStatus, KanbanStage, NewPartner, Partner, PartnerDocStatus, PartnerPatch,
    PartnerQuery, PartnerSortField, PartnerStatus,
};
pub use people::{LinkedRef, NewPerson, PeopleQuery, Person, PersonPatch};
pub use reminder::{NewReminder, Reminder, ReminderCompletion, ReminderLevel};
pub use user::{NewUser, PublicUser, UserAccount, UserRole};
