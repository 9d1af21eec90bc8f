use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{
    AgreementDraft, AgreementFilter, ListingFilter, MarketStore, MessageDraft, MessageFilter,
    StoreError, UserFilter,
};
use crate::marketplace::domain::{
    Agreement, AgreementId, ImageId, ImageRecord, Listing, ListingId, Message, MessageId,
    NewImage, NewListing, NewUser, Party, User, UserId,
};
use crate::marketplace::geocode::GeoPoint;

/// In-process entity store. One mutex over the whole state doubles as the
/// serializable transaction scope: reserve, sign, and image replacement each
/// run inside a single `lock()`.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    listings: HashMap<ListingId, Listing>,
    agreements: HashMap<AgreementId, Agreement>,
    messages: HashMap<MessageId, Message>,
    images: HashMap<ImageId, ImageRecord>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    users: u64,
    listings: u64,
    agreements: u64,
    messages: u64,
    images: u64,
}

fn next_id(counter: &mut u64, prefix: &str) -> String {
    *counter += 1;
    format!("{prefix}-{:06}", *counter)
}

impl State {
    fn new_image_record(&mut self, image: NewImage) -> ImageRecord {
        let id = ImageId(next_id(&mut self.sequences.images, "img"));
        let record = ImageRecord {
            id: id.clone(),
            data: image.data,
            content_type: image.content_type,
            filename: image.filename,
        };
        self.images.insert(id, record.clone());
        record
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }
}

impl MarketStore for InMemoryStore {
    fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.lock();
        let id = UserId(next_id(&mut state.sequences.users, "user"));
        let user = User {
            id: id.clone(),
            name: new.name,
            email: new.email,
            password: new.password,
            wallet_address: new.wallet_address,
            zipcode: new.zipcode,
            saved_listings: Vec::new(),
            profile_image: None,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(id).cloned())
    }

    fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|user| user.email == email && user.password == password)
            .cloned())
    }

    fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let state = self.lock();
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| filter.id.as_ref().map_or(true, |id| &user.id == id))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(users)
    }

    fn delete_user(&self, id: &UserId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let user = state.users.remove(id).ok_or(StoreError::NotFound("user"))?;
        if let Some(image) = user.profile_image {
            state.images.remove(&image);
        }
        Ok(())
    }

    fn save_listing(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(listing) {
            return Err(StoreError::NotFound("listing"));
        }
        let user = state
            .users
            .get_mut(user)
            .ok_or(StoreError::NotFound("user"))?;
        if !user.saved_listings.contains(listing) {
            user.saved_listings.push(listing.clone());
        }
        Ok(())
    }

    fn unsave_listing(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(user)
            .ok_or(StoreError::NotFound("user"))?;
        user.saved_listings.retain(|saved| saved != listing);
        Ok(())
    }

    fn saved_listings(&self, user: &UserId) -> Result<Vec<Listing>, StoreError> {
        let state = self.lock();
        let user = state.users.get(user).ok_or(StoreError::NotFound("user"))?;
        Ok(user
            .saved_listings
            .iter()
            .filter_map(|id| state.listings.get(id).cloned())
            .collect())
    }

    fn replace_profile_image(
        &self,
        user: &UserId,
        image: NewImage,
    ) -> Result<ImageRecord, StoreError> {
        let mut state = self.lock();
        if !state.users.contains_key(user) {
            return Err(StoreError::NotFound("user"));
        }
        let record = state.new_image_record(image);
        let previous = {
            let user = state.users.get_mut(user).expect("checked above");
            std::mem::replace(&mut user.profile_image, Some(record.id.clone()))
        };
        if let Some(previous) = previous {
            state.images.remove(&previous);
        }
        Ok(record)
    }

    fn insert_listing(
        &self,
        new: NewListing,
        location: Option<GeoPoint>,
    ) -> Result<Listing, StoreError> {
        let mut state = self.lock();
        if !state.users.contains_key(&new.owner) {
            return Err(StoreError::NotFound("user"));
        }
        let id = ListingId(next_id(&mut state.sequences.listings, "listing"));
        let listing = Listing {
            id: id.clone(),
            title: new.title,
            description: new.description,
            address: new.address,
            location,
            website: new.website,
            rent: new.rent,
            security_deposit: new.security_deposit,
            window: new.window,
            capacity: new.capacity,
            owner: new.owner,
            images: Vec::new(),
            agreements: Vec::new(),
        };
        state.listings.insert(id, listing.clone());
        Ok(listing)
    }

    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.lock().listings.get(id).cloned())
    }

    fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        let state = self.lock();
        let mut listings: Vec<Listing> = state
            .listings
            .values()
            .filter(|listing| filter.id.as_ref().map_or(true, |id| &listing.id == id))
            .filter(|listing| filter.owner.as_ref().map_or(true, |owner| &listing.owner == owner))
            .filter(|listing| filter.range.as_ref().map_or(true, |range| listing.window.overlaps(range)))
            .cloned()
            .collect();
        listings.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(listings)
    }

    fn update_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(&listing.id) {
            return Err(StoreError::NotFound("listing"));
        }
        let outside = listing.agreements.iter().any(|id| {
            state
                .agreements
                .get(id)
                .is_some_and(|agreement| !listing.window.contains(&agreement.term))
        });
        if outside {
            return Err(StoreError::OutsideWindow);
        }
        state.listings.insert(listing.id.clone(), listing);
        Ok(())
    }

    fn delete_listing(&self, id: &ListingId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let listing = state
            .listings
            .remove(id)
            .ok_or(StoreError::NotFound("listing"))?;
        for image in &listing.images {
            state.images.remove(image);
        }
        for agreement in &listing.agreements {
            state.agreements.remove(agreement);
        }
        Ok(())
    }

    fn add_listing_image(
        &self,
        listing: &ListingId,
        image: NewImage,
    ) -> Result<ImageRecord, StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(listing) {
            return Err(StoreError::NotFound("listing"));
        }
        let record = state.new_image_record(image);
        state
            .listings
            .get_mut(listing)
            .expect("checked above")
            .images
            .push(record.id.clone());
        Ok(record)
    }

    fn reserve_agreement(&self, draft: AgreementDraft) -> Result<Agreement, StoreError> {
        let mut state = self.lock();
        let listing = state
            .listings
            .get(&draft.listing)
            .ok_or(StoreError::NotFound("listing"))?;
        if !listing.window.contains(&draft.term) {
            return Err(StoreError::OutsideWindow);
        }
        let taken = listing.agreements.iter().any(|id| {
            state
                .agreements
                .get(id)
                .is_some_and(|existing| existing.term.overlaps(&draft.term))
        });
        if taken {
            return Err(StoreError::SlotTaken);
        }

        let id = AgreementId(next_id(&mut state.sequences.agreements, "agreement"));
        let agreement = Agreement {
            id: id.clone(),
            term: draft.term,
            rent: draft.rent,
            security_deposit: draft.security_deposit,
            num_people: draft.num_people,
            pay_term: draft.pay_term,
            listing: draft.listing.clone(),
            owner: draft.owner,
            tenant: draft.tenant,
            owner_sign_date: None,
            tenant_sign_date: None,
        };
        state.agreements.insert(id.clone(), agreement.clone());
        state
            .listings
            .get_mut(&draft.listing)
            .expect("fetched above")
            .agreements
            .push(id);
        Ok(agreement)
    }

    fn fetch_agreement(&self, id: &AgreementId) -> Result<Option<Agreement>, StoreError> {
        Ok(self.lock().agreements.get(id).cloned())
    }

    fn agreements_for_listing(&self, listing: &ListingId) -> Result<Vec<Agreement>, StoreError> {
        let state = self.lock();
        let listing = state
            .listings
            .get(listing)
            .ok_or(StoreError::NotFound("listing"))?;
        Ok(listing
            .agreements
            .iter()
            .filter_map(|id| state.agreements.get(id).cloned())
            .collect())
    }

    fn list_agreements(&self, filter: &AgreementFilter) -> Result<Vec<Agreement>, StoreError> {
        let state = self.lock();
        let mut agreements: Vec<Agreement> = state
            .agreements
            .values()
            .filter(|agreement| filter.id.as_ref().map_or(true, |id| &agreement.id == id))
            .filter(|agreement| filter.owner.as_ref().map_or(true, |owner| &agreement.owner == owner))
            .filter(|agreement| filter.tenant.as_ref().map_or(true, |tenant| &agreement.tenant == tenant))
            .filter(|agreement| filter.range.as_ref().map_or(true, |range| agreement.term.overlaps(range)))
            .cloned()
            .collect();
        agreements.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(agreements)
    }

    fn sign_agreement(
        &self,
        id: &AgreementId,
        signer: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Agreement, StoreError> {
        let mut state = self.lock();
        let agreement = state
            .agreements
            .get_mut(id)
            .ok_or(StoreError::NotFound("agreement"))?;
        match agreement.party_for(signer) {
            Some(Party::Owner) => agreement.owner_sign_date = Some(at),
            Some(Party::Tenant) => agreement.tenant_sign_date = Some(at),
            None => return Err(StoreError::NotParty),
        }
        Ok(agreement.clone())
    }

    fn delete_agreement(&self, id: &AgreementId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let agreement = state
            .agreements
            .remove(id)
            .ok_or(StoreError::NotFound("agreement"))?;
        if let Some(listing) = state.listings.get_mut(&agreement.listing) {
            listing.agreements.retain(|existing| existing != id);
        }
        Ok(())
    }

    fn insert_message(&self, draft: MessageDraft) -> Result<Message, StoreError> {
        let mut state = self.lock();
        let id = MessageId(next_id(&mut state.sequences.messages, "msg"));
        let message = Message {
            id: id.clone(),
            sender: draft.sender,
            participants: draft.participants,
            content: draft.content,
            sent_at: draft.sent_at,
        };
        state.messages.insert(id, message.clone());
        Ok(message)
    }

    fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, StoreError> {
        let state = self.lock();
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|message| {
                filter
                    .participant
                    .as_ref()
                    .map_or(true, |user| message.participants.contains(user))
            })
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(messages)
    }

    fn delete_message(&self, id: &MessageId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state
            .messages
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("message"))
    }

    fn fetch_image(&self, id: &ImageId) -> Result<Option<ImageRecord>, StoreError> {
        Ok(self.lock().images.get(id).cloned())
    }
}
