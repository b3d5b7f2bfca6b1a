use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A template bound to a calendar. `holder_id` and `reserved_at` are either
/// both set or both empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInstance {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub slot_template_id: Uuid,
    pub holder_id: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
}

impl SlotInstance {
    pub fn free(calendar_id: Uuid, slot_template_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            calendar_id,
            slot_template_id,
            holder_id: None,
            reserved_at: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.holder_id.is_none()
    }

    pub fn is_held_by(&self, person_id: Uuid) -> bool {
        self.holder_id == Some(person_id)
    }
}

/// A slot joined with its template label, as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub slot_instance_id: Uuid,
    pub calendar_id: Uuid,
    pub slot_template_id: Uuid,
    pub slot_template_label: String,
    pub holder_id: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub slot_instance_id: Uuid,
    pub slot_template_label: String,
}

impl From<SlotView> for AvailableSlot {
    fn from(view: SlotView) -> Self {
        Self {
            slot_instance_id: view.slot_instance_id,
            slot_template_label: view.slot_template_label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub slot_template_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub new_slot_instance_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub slot_instance_id: Uuid,
    pub reserved_at: DateTime<Utc>,
}

/// A held slot seen from the patient's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub slot_instance_id: Uuid,
    pub calendar_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slot_template_label: String,
    pub reserved_at: DateTime<Utc>,
}

pub type Receipt = Appointment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T: Clone> Page<T> {
    /// Slices `items` into pages of `per_page`. Out-of-range page numbers are
    /// clamped to the first or last page.
    pub fn paginate(items: &[T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(total_items);

        Self {
            items: items[start.min(total_items)..end].to_vec(),
            page,
            per_page,
            total_pages,
            total_items,
        }
    }
}
