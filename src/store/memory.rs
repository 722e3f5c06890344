use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    CrmStore, DashboardQueries, FeatureRepository, KnowledgeRepository, PartnerRepository,
    PeopleRepository, ReminderRepository, StoreFuture, UserRepository,
};
use crate::error::{CrmError, Result};
use crate::lifecycle::{plan_partner_create, plan_partner_update};
use crate::types::{
    DashboardStats, Feature, FeatureCounts, FeatureInput, FeatureQuery, KnowledgeCounts,
    KnowledgeNote, LinkedRef, NewPartner, NewPerson, NewReminder, NewUser, NoteInput, NoteQuery,
    Page, Partner, PartnerCounts, PartnerPatch, PartnerQuery, PartnerSortField, PeopleQuery,
    Person, PersonPatch, PinnedNoteSummary, RecentPartner, Reminder, SortOrder, UserAccount,
    UserRole, DASHBOARD_LIST_LIMIT,
};

#[derive(Debug, Clone)]
struct PersonRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    role: String,
    notes: Option<String>,
    partner_ids: Vec<Uuid>,
    feature_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    partners: HashMap<Uuid, Partner>,
    people: HashMap<Uuid, PersonRow>,
    notes: HashMap<Uuid, KnowledgeNote>,
    reminders: HashMap<Uuid, Reminder>,
    features: HashMap<Uuid, Feature>,
    users: Vec<UserAccount>,
}

impl Tables {
    fn hydrate_person(&self, row: &PersonRow) -> Person {
        let partners = row
            .partner_ids
            .iter()
            .filter_map(|id| self.partners.get(id))
            .map(|partner| LinkedRef {
                id: partner.id,
                name: partner.name.clone(),
            })
            .collect();
        let features = row
            .feature_ids
            .iter()
            .filter_map(|id| self.features.get(id))
            .map(|feature| LinkedRef {
                id: feature.id,
                name: feature.name.clone(),
            })
            .collect();

        Person {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            role: row.role.clone(),
            notes: row.notes.clone(),
            partners,
            features,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn ensure_links_exist(&self, partner_ids: &[Uuid], feature_ids: &[Uuid]) -> Result<()> {
        if let Some(missing) = partner_ids
            .iter()
            .find(|id| !self.partners.contains_key(id))
        {
            return Err(CrmError::not_found("Partner", missing));
        }
        if let Some(missing) = feature_ids
            .iter()
            .find(|id| !self.features.contains_key(id))
        {
            return Err(CrmError::not_found("Feature", missing));
        }
        Ok(())
    }
}

/// Process-local store. Every mutation holds the write lock for its whole
/// read-check-write sequence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn normalised_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn sort_partners(partners: &mut [Partner], field: PartnerSortField, order: SortOrder) {
    partners.sort_by(|a, b| {
        let ordering = match field {
            PartnerSortField::Name => a.name.cmp(&b.name),
            PartnerSortField::Code => a.code.cmp(&b.code),
            PartnerSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            PartnerSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            PartnerSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

impl PartnerRepository for MemoryStore {
    fn list_partners(&self, query: PartnerQuery) -> StoreFuture<'_, Page<Partner>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let search = normalised_search(query.search.as_deref());
            let mut matching = tables
                .partners
                .values()
                .filter(|partner| query.status.map_or(true, |status| partner.status == status))
                .filter(|partner| {
                    search.as_deref().map_or(true, |needle| {
                        contains_ci(&partner.name, needle)
                            || contains_ci(&partner.code, needle)
                            || partner
                                .integrator
                                .as_deref()
                                .is_some_and(|integrator| contains_ci(integrator, needle))
                    })
                })
                .cloned()
                .collect::<Vec<_>>();
            sort_partners(&mut matching, query.sort_by, query.order);
            Ok(query.page.slice(matching))
        })
    }

    fn list_kanban_partners(&self) -> StoreFuture<'_, Vec<Partner>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let mut board = tables
                .partners
                .values()
                .filter(|partner| partner.status.is_on_kanban())
                .cloned()
                .collect::<Vec<_>>();
            board.sort_by_key(|partner| Reverse(partner.updated_at));
            Ok(board)
        })
    }

    fn get_partner(&self, id: Uuid) -> StoreFuture<'_, Option<Partner>> {
        Box::pin(async move { Ok(self.tables.read().await.partners.get(&id).cloned()) })
    }

    fn create_partner(&self, new_partner: NewPartner) -> StoreFuture<'_, Partner> {
        Box::pin(async move {
            let planned = plan_partner_create(new_partner)?;
            let partner = planned.into_partner(Uuid::new_v4(), Utc::now());
            self.tables
                .write()
                .await
                .partners
                .insert(partner.id, partner.clone());
            info!("Created partner {} ({})", partner.id, partner.code);
            Ok(partner)
        })
    }

    fn update_partner(&self, id: Uuid, patch: PartnerPatch) -> StoreFuture<'_, Partner> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let partner = tables
                .partners
                .get_mut(&id)
                .ok_or_else(|| CrmError::not_found("Partner", id))?;

            let planned = plan_partner_update(partner, patch).inspect_err(|violation| {
                warn!("Rejected stage change for partner {id}: {violation}");
            })?;

            partner.apply(planned, Utc::now());
            debug!(
                "Updated partner {id}: status={} stage={:?}",
                partner.status, partner.kanban_stage
            );
            Ok(partner.clone())
        })
    }

    fn delete_partner(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let removed = tables.partners.remove(&id).is_some();
            if removed {
                for person in tables.people.values_mut() {
                    person.partner_ids.retain(|linked| *linked != id);
                }
            }
            Ok(removed)
        })
    }
}

impl PeopleRepository for MemoryStore {
    fn list_people(&self, query: PeopleQuery) -> StoreFuture<'_, Page<Person>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let search = normalised_search(query.search.as_deref());
            let matching = tables
                .people
                .values()
                .filter(|person| {
                    search.as_deref().map_or(true, |needle| {
                        contains_ci(&person.name, needle)
                            || contains_ci(&person.role, needle)
                            || person
                                .email
                                .as_deref()
                                .is_some_and(|email| contains_ci(email, needle))
                    })
                })
                .sorted_by_key(|person| Reverse(person.updated_at))
                .map(|row| tables.hydrate_person(row))
                .collect::<Vec<_>>();
            Ok(query.page.slice(matching))
        })
    }

    fn get_person(&self, id: Uuid) -> StoreFuture<'_, Option<Person>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables.people.get(&id).map(|row| tables.hydrate_person(row)))
        })
    }

    fn create_person(&self, person: NewPerson) -> StoreFuture<'_, Person> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            tables.ensure_links_exist(&person.partner_ids, &person.feature_ids)?;
            let now = Utc::now();
            let row = PersonRow {
                id: Uuid::new_v4(),
                name: person.name,
                email: person.email,
                phone: person.phone,
                role: person.role,
                notes: person.notes,
                partner_ids: person.partner_ids.into_iter().unique().collect(),
                feature_ids: person.feature_ids.into_iter().unique().collect(),
                created_at: now,
                updated_at: now,
            };
            let hydrated = tables.hydrate_person(&row);
            tables.people.insert(row.id, row);
            Ok(hydrated)
        })
    }

    fn update_person(&self, id: Uuid, patch: PersonPatch) -> StoreFuture<'_, Person> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            tables.ensure_links_exist(
                patch.partner_ids.as_deref().unwrap_or_default(),
                patch.feature_ids.as_deref().unwrap_or_default(),
            )?;
            let row = tables
                .people
                .get_mut(&id)
                .ok_or_else(|| CrmError::not_found("Person", id))?;

            if let Some(name) = patch.name {
                row.name = name;
            }
            if let Some(email) = patch.email {
                row.email = Some(email);
            }
            if let Some(phone) = patch.phone {
                row.phone = Some(phone);
            }
            if let Some(role) = patch.role {
                row.role = role;
            }
            if let Some(notes) = patch.notes {
                row.notes = Some(notes);
            }
            if let Some(partner_ids) = patch.partner_ids {
                row.partner_ids = partner_ids.into_iter().unique().collect();
            }
            if let Some(feature_ids) = patch.feature_ids {
                row.feature_ids = feature_ids.into_iter().unique().collect();
            }
            row.updated_at = Utc::now();

            let row = row.clone();
            Ok(tables.hydrate_person(&row))
        })
    }

    fn delete_person(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.tables.write().await.people.remove(&id).is_some()) })
    }
}

impl KnowledgeRepository for MemoryStore {
    fn list_notes(&self, query: NoteQuery) -> StoreFuture<'_, Page<KnowledgeNote>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let text = normalised_search(query.text.as_deref());
            let matching = tables
                .notes
                .values()
                .filter(|note| {
                    text.as_deref().map_or(true, |needle| {
                        contains_ci(&note.title, needle) || contains_ci(&note.content, needle)
                    })
                })
                .filter(|note| {
                    query
                        .tag
                        .as_deref()
                        .map_or(true, |tag| note.tags.iter().any(|t| t == tag))
                })
                .sorted_by_key(|note| (Reverse(note.is_pinned), Reverse(note.updated_at)))
                .cloned()
                .collect::<Vec<_>>();
            Ok(query.page.slice(matching))
        })
    }

    fn get_note(&self, id: Uuid) -> StoreFuture<'_, Option<KnowledgeNote>> {
        Box::pin(async move { Ok(self.tables.read().await.notes.get(&id).cloned()) })
    }

    fn create_note(&self, note: NoteInput) -> StoreFuture<'_, KnowledgeNote> {
        Box::pin(async move {
            let now = Utc::now();
            let note = KnowledgeNote {
                id: Uuid::new_v4(),
                title: note.title,
                content: note.content,
                tags: note.tags,
                is_pinned: note.is_pinned,
                created_at: now,
                updated_at: now,
            };
            self.tables
                .write()
                .await
                .notes
                .insert(note.id, note.clone());
            Ok(note)
        })
    }

    fn replace_note(&self, id: Uuid, input: NoteInput) -> StoreFuture<'_, KnowledgeNote> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let note = tables
                .notes
                .get_mut(&id)
                .ok_or_else(|| CrmError::not_found("Note", id))?;
            note.title = input.title;
            note.content = input.content;
            note.tags = input.tags;
            note.is_pinned = input.is_pinned;
            note.updated_at = Utc::now();
            Ok(note.clone())
        })
    }

    fn delete_note(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.tables.write().await.notes.remove(&id).is_some()) })
    }
}

impl ReminderRepository for MemoryStore {
    fn list_reminders(&self, active_at: Option<DateTime<Utc>>) -> StoreFuture<'_, Vec<Reminder>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .reminders
                .values()
                .filter(|reminder| active_at.map_or(true, |now| reminder.is_active_at(now)))
                .sorted_by_key(|reminder| reminder.scheduled_at)
                .cloned()
                .collect())
        })
    }

    fn create_reminder(&self, reminder: NewReminder) -> StoreFuture<'_, Reminder> {
        Box::pin(async move {
            let now = Utc::now();
            let reminder = Reminder {
                id: Uuid::new_v4(),
                title: reminder.title,
                scheduled_at: reminder.scheduled_at,
                level: reminder.level,
                is_completed: false,
                created_at: now,
                updated_at: now,
            };
            self.tables
                .write()
                .await
                .reminders
                .insert(reminder.id, reminder.clone());
            Ok(reminder)
        })
    }

    fn set_reminder_completed(&self, id: Uuid, completed: bool) -> StoreFuture<'_, Reminder> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let reminder = tables
                .reminders
                .get_mut(&id)
                .ok_or_else(|| CrmError::not_found("Reminder", id))?;
            reminder.is_completed = completed;
            reminder.updated_at = Utc::now();
            Ok(reminder.clone())
        })
    }

    fn delete_reminder(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.tables.write().await.reminders.remove(&id).is_some()) })
    }
}

impl FeatureRepository for MemoryStore {
    fn list_features(&self, query: FeatureQuery) -> StoreFuture<'_, Page<Feature>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let search = normalised_search(query.search.as_deref());
            let matching = tables
                .features
                .values()
                .filter(|feature| {
                    query
                        .category
                        .map_or(true, |category| feature.category == category)
                })
                .filter(|feature| {
                    search
                        .as_deref()
                        .map_or(true, |needle| contains_ci(&feature.name, needle))
                })
                .sorted_by_key(|feature| Reverse(feature.updated_at))
                .cloned()
                .collect::<Vec<_>>();
            Ok(query.page.slice(matching))
        })
    }

    fn get_feature(&self, id: Uuid) -> StoreFuture<'_, Option<Feature>> {
        Box::pin(async move { Ok(self.tables.read().await.features.get(&id).cloned()) })
    }

    fn create_feature(&self, input: FeatureInput) -> StoreFuture<'_, Feature> {
        Box::pin(async move {
            let now = Utc::now();
            let feature = Feature {
                id: Uuid::new_v4(),
                name: input.name,
                category: input.category,
                apigee_products: input.apigee_products,
                apigee_trace_proxies: input.apigee_trace_proxies,
                notes: input.notes,
                created_at: now,
                updated_at: now,
            };
            self.tables
                .write()
                .await
                .features
                .insert(feature.id, feature.clone());
            Ok(feature)
        })
    }

    fn replace_feature(&self, id: Uuid, input: FeatureInput) -> StoreFuture<'_, Feature> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let feature = tables
                .features
                .get_mut(&id)
                .ok_or_else(|| CrmError::not_found("Feature", id))?;
            feature.name = input.name;
            feature.category = input.category;
            feature.apigee_products = input.apigee_products;
            feature.apigee_trace_proxies = input.apigee_trace_proxies;
            feature.notes = input.notes;
            feature.updated_at = Utc::now();
            Ok(feature.clone())
        })
    }

    fn delete_feature(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let removed = tables.features.remove(&id).is_some();
            if removed {
                for person in tables.people.values_mut() {
                    person.feature_ids.retain(|linked| *linked != id);
                }
            }
            Ok(removed)
        })
    }
}

impl DashboardQueries for MemoryStore {
    fn dashboard_stats(&self) -> StoreFuture<'_, DashboardStats> {
        Box::pin(async move {
            let tables = self.tables.read().await;

            let (partner_total, by_status) = DashboardStats::tally(
                tables
                    .partners
                    .values()
                    .map(|partner| partner.status.as_str().to_string())
                    .counts()
                    .into_iter()
                    .map(|(key, count)| (key, count as u64)),
            );
            let (feature_total, by_category) = DashboardStats::tally(
                tables
                    .features
                    .values()
                    .map(|feature| feature.category.as_str().to_string())
                    .counts()
                    .into_iter()
                    .map(|(key, count)| (key, count as u64)),
            );

            let pinned = tables
                .notes
                .values()
                .filter(|note| note.is_pinned)
                .sorted_by_key(|note| Reverse(note.updated_at))
                .collect::<Vec<_>>();

            Ok(DashboardStats {
                partners: PartnerCounts {
                    total: partner_total,
                    by_status,
                },
                features: FeatureCounts {
                    total: feature_total,
                    by_category,
                },
                knowledge: KnowledgeCounts {
                    total: tables.notes.len() as u64,
                    pinned: pinned.len() as u64,
                },
                pinned_notes: pinned
                    .iter()
                    .take(DASHBOARD_LIST_LIMIT)
                    .map(|note| PinnedNoteSummary::from(*note))
                    .collect(),
                recent_partners: tables
                    .partners
                    .values()
                    .sorted_by_key(|partner| Reverse(partner.updated_at))
                    .take(DASHBOARD_LIST_LIMIT)
                    .map(RecentPartner::from)
                    .collect(),
            })
        })
    }
}

impl UserRepository for MemoryStore {
    fn find_user_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> StoreFuture<'a, Option<UserAccount>> {
        Box::pin(async move {
            Ok(self
                .tables
                .read()
                .await
                .users
                .iter()
                .find(|user| user.email == email)
                .cloned())
        })
    }

    fn create_user(&self, user: NewUser) -> StoreFuture<'_, UserAccount> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            if tables.users.iter().any(|existing| existing.email == user.email) {
                return Err(CrmError::Exists("Email already exists".to_string()));
            }
            let is_first = tables.users.is_empty();
            let account = UserAccount {
                id: Uuid::new_v4(),
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                role: if is_first { UserRole::Admin } else { UserRole::User },
                is_approved: is_first,
                created_at: Utc::now(),
            };
            tables.users.push(account.clone());
            Ok(account)
        })
    }
}

impl CrmStore for MemoryStore {
    fn backend_label(&self) -> &'static str {
        "memory"
    }
}
