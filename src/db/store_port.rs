use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::CrmDb;
use crate::store::{
    CrmStore, DashboardQueries, FeatureRepository, KnowledgeRepository, PartnerRepository,
    PeopleRepository, ReminderRepository, StoreFuture, UserRepository,
};
use crate::types::{
    DashboardStats, Feature, FeatureInput, FeatureQuery, KnowledgeNote, NewPartner, NewPerson,
    NewReminder, NewUser, NoteInput, NoteQuery, Page, Partner, PartnerPatch, PartnerQuery,
    PeopleQuery, Person, PersonPatch, Reminder, UserAccount,
};

impl PartnerRepository for CrmDb {
    fn list_partners(&self, query: PartnerQuery) -> StoreFuture<'_, Page<Partner>> {
        Box::pin(async move { self.fetch_partner_page(&query).await })
    }

    fn list_kanban_partners(&self) -> StoreFuture<'_, Vec<Partner>> {
        Box::pin(self.fetch_kanban_partners())
    }

    fn get_partner(&self, id: Uuid) -> StoreFuture<'_, Option<Partner>> {
        Box::pin(self.fetch_partner(id))
    }

    fn create_partner(&self, new_partner: NewPartner) -> StoreFuture<'_, Partner> {
        Box::pin(self.insert_partner(new_partner))
    }

    fn update_partner(&self, id: Uuid, patch: PartnerPatch) -> StoreFuture<'_, Partner> {
        Box::pin(self.update_partner_guarded(id, patch))
    }

    fn delete_partner(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(self.delete_partner_row(id))
    }
}

impl PeopleRepository for CrmDb {
    fn list_people(&self, query: PeopleQuery) -> StoreFuture<'_, Page<Person>> {
        Box::pin(async move { self.fetch_people_page(&query).await })
    }

    fn get_person(&self, id: Uuid) -> StoreFuture<'_, Option<Person>> {
        Box::pin(self.fetch_person(id))
    }

    fn create_person(&self, person: NewPerson) -> StoreFuture<'_, Person> {
        Box::pin(self.insert_person(person))
    }

    fn update_person(&self, id: Uuid, patch: PersonPatch) -> StoreFuture<'_, Person> {
        Box::pin(self.update_person_row(id, patch))
    }

    fn delete_person(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(self.delete_person_row(id))
    }
}

impl KnowledgeRepository for CrmDb {
    fn list_notes(&self, query: NoteQuery) -> StoreFuture<'_, Page<KnowledgeNote>> {
        Box::pin(async move { self.fetch_note_page(&query).await })
    }

    fn get_note(&self, id: Uuid) -> StoreFuture<'_, Option<KnowledgeNote>> {
        Box::pin(self.fetch_note(id))
    }

    fn create_note(&self, note: NoteInput) -> StoreFuture<'_, KnowledgeNote> {
        Box::pin(self.insert_note(note))
    }

    fn replace_note(&self, id: Uuid, note: NoteInput) -> StoreFuture<'_, KnowledgeNote> {
        Box::pin(self.replace_note_row(id, note))
    }

    fn delete_note(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(self.delete_note_row(id))
    }
}

impl ReminderRepository for CrmDb {
    fn list_reminders(&self, active_at: Option<DateTime<Utc>>) -> StoreFuture<'_, Vec<Reminder>> {
        Box::pin(self.fetch_reminders(active_at))
    }

    fn create_reminder(&self, reminder: NewReminder) -> StoreFuture<'_, Reminder> {
        Box::pin(self.insert_reminder(reminder))
    }

    fn set_reminder_completed(&self, id: Uuid, completed: bool) -> StoreFuture<'_, Reminder> {
        Box::pin(self.mark_reminder(id, completed))
    }

    fn delete_reminder(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(self.delete_reminder_row(id))
    }
}

impl FeatureRepository for CrmDb {
    fn list_features(&self, query: FeatureQuery) -> StoreFuture<'_, Page<Feature>> {
        Box::pin(async move { self.fetch_feature_page(&query).await })
    }

    fn get_feature(&self, id: Uuid) -> StoreFuture<'_, Option<Feature>> {
        Box::pin(self.fetch_feature(id))
    }

    fn create_feature(&self, feature: FeatureInput) -> StoreFuture<'_, Feature> {
        Box::pin(self.insert_feature(feature))
    }

    fn replace_feature(&self, id: Uuid, feature: FeatureInput) -> StoreFuture<'_, Feature> {
        Box::pin(self.replace_feature_row(id, feature))
    }

    fn delete_feature(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(self.delete_feature_row(id))
    }
}

impl DashboardQueries for CrmDb {
    fn dashboard_stats(&self) -> StoreFuture<'_, DashboardStats> {
        Box::pin(self.fetch_dashboard_stats())
    }
}

impl UserRepository for CrmDb {
    fn find_user_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> StoreFuture<'a, Option<UserAccount>> {
        Box::pin(self.fetch_user_by_email(email))
    }

    fn create_user(&self, user: NewUser) -> StoreFuture<'_, UserAccount> {
        Box::pin(self.insert_user(user))
    }
}

impl CrmStore for CrmDb {
    fn backend_label(&self) -> &'static str {
        "postgres"
    }
}
