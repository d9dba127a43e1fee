//! redb-based storage layer for marketplace entities
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `listings` | `listing_id` | `Listing` | Produce listings |
//! | `offers` | `offer_id` | `Offer` | Buyer offers |
//! | `offers_by_listing` | `(listing_id, offer_id)` | `()` | Listing offer index |
//! | `offers_by_buyer` | `(buyer_id, offer_id)` | `()` | Buyer offer index |
//! | `offer_expiry` | `(expires_at_millis, offer_id)` | `()` | Pending-offer expiry queue |
//! | `orders` | `order_id` | `Order` | Orders |
//! | `orders_by_user` | `(user_id, order_id)` | `()` | Participant order index |
//! | `payments` | `(order_id, payment_id)` | `Payment` | Payment attempts per order |
//! | `shipments` | `order_id` | `Shipment` | One shipment per order |
//! | `disputes` | `dispute_id` | `Dispute` | Disputes |
//! | `disputes_by_user` | `(user_id, dispute_id)` | `()` | Participant dispute index |
//! | `reviews` | `review_id` | `Review` | Reviews |
//! | `reviews_by_order` | `(order_id, from_user_id)` | `review_id` | One review per order+author |
//! | `reviews_by_user` | `(to_user_id, review_id)` | `()` | Reviews received index |
//! | `threads` | `thread_id` | `Thread` | Conversations |
//! | `threads_by_user` | `(user_id, thread_id)` | `()` | Participant thread index |
//! | `thread_lookup` | `(buyer_id, seller_id, listing_id)` | `thread_id` | Thread dedup |
//! | `messages` | `(thread_id, message_id)` | `Message` | Thread messages |
//! | `notifications` | `(user_id, notification_id)` | `Notification` | In-app notifications |
//! | `audit_logs` | `(entity_key, audit_id)` | `AuditLog` | Append-only audit trail |
//! | `payouts` | `(seller_id, payout_id)` | `Payout` | Seller payout ledger |
//! | `processed_commands` | `command_id` | response JSON | Idempotency replay |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns; the database
//! file is always in a consistent state. Every lifecycle transition writes
//! all of its entity mutations through one `WriteTransaction`, so a crash
//! mid-transition can never expose a partially applied state.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::EntityKind;
use shared::models::{
    AuditLog, Dispute, Listing, ListingStatus, Message, Notification, Offer, OfferStatus, Order,
    Payment, Payout, Review, Shipment, Thread,
};
use thiserror::Error;

const LISTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("listings");

const OFFERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("offers");

const OFFERS_BY_LISTING_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("offers_by_listing");

const OFFERS_BY_BUYER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("offers_by_buyer");

/// Pending offers keyed by expiry time; entries are removed once an offer
/// leaves `pending`, so a range scan up to "now" yields sweep candidates.
const OFFER_EXPIRY_TABLE: TableDefinition<(i64, &str), ()> = TableDefinition::new("offer_expiry");

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Indexed once for the buyer and once for the seller.
const ORDERS_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("orders_by_user");

/// All payment attempts for an order, including failed ones.
const PAYMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("payments");

const SHIPMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("shipments");

const DISPUTES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("disputes");

/// Indexed for the raiser and the respondent.
const DISPUTES_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("disputes_by_user");

const REVIEWS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reviews");

/// Enforces one review per (order, author) pair.
const REVIEWS_BY_ORDER_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("reviews_by_order");

const REVIEWS_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("reviews_by_user");

const THREADS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("threads");

const THREADS_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("threads_by_user");

/// Thread dedup per (buyer, seller, listing); listing-less threads use "".
const THREAD_LOOKUP_TABLE: TableDefinition<(&str, &str, &str), &str> =
    TableDefinition::new("thread_lookup");

const MESSAGES_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("messages");

const NOTIFICATIONS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("notifications");

/// Key is `"{entity_kind}:{entity_id}"`.
const AUDIT_LOGS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("audit_logs");

const PAYOUTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("payouts");

/// Value is the serialized success envelope of the recorded execution.
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("processed_commands");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn entity_key(kind: EntityKind, id: &str) -> String {
    format!("{}:{}", kind.as_str(), id)
}

/// Marketplace storage backed by redb
#[derive(Clone)]
pub struct MarketStorage {
    db: Arc<Database>,
}

impl MarketStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LISTINGS_TABLE)?;
            let _ = write_txn.open_table(OFFERS_TABLE)?;
            let _ = write_txn.open_table(OFFERS_BY_LISTING_TABLE)?;
            let _ = write_txn.open_table(OFFERS_BY_BUYER_TABLE)?;
            let _ = write_txn.open_table(OFFER_EXPIRY_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_USER_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(SHIPMENTS_TABLE)?;
            let _ = write_txn.open_table(DISPUTES_TABLE)?;
            let _ = write_txn.open_table(DISPUTES_BY_USER_TABLE)?;
            let _ = write_txn.open_table(REVIEWS_TABLE)?;
            let _ = write_txn.open_table(REVIEWS_BY_ORDER_TABLE)?;
            let _ = write_txn.open_table(REVIEWS_BY_USER_TABLE)?;
            let _ = write_txn.open_table(THREADS_TABLE)?;
            let _ = write_txn.open_table(THREADS_BY_USER_TABLE)?;
            let _ = write_txn.open_table(THREAD_LOOKUP_TABLE)?;
            let _ = write_txn.open_table(MESSAGES_TABLE)?;
            let _ = write_txn.open_table(NOTIFICATIONS_TABLE)?;
            let _ = write_txn.open_table(AUDIT_LOGS_TABLE)?;
            let _ = write_txn.open_table(PAYOUTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Command Idempotency ==========

    /// Get the recorded response for a processed command
    pub fn get_command_response(&self, command_id: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_vec()))
    }

    /// Get the recorded response for a processed command (within transaction)
    pub fn get_command_response_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<Vec<u8>>> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_vec()))
    }

    /// Record a command's response for idempotent replay
    pub fn record_command_response(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        response: &[u8],
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, response)?;
        Ok(())
    }

    // ========== Listings ==========

    /// Store a listing (insert or overwrite)
    pub fn store_listing(&self, txn: &WriteTransaction, listing: &Listing) -> StorageResult<()> {
        let mut table = txn.open_table(LISTINGS_TABLE)?;
        let value = serde_json::to_vec(listing)?;
        table.insert(listing.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a listing by ID
    pub fn get_listing(&self, listing_id: &str) -> StorageResult<Option<Listing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTINGS_TABLE)?;
        match table.get(listing_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a listing by ID (within transaction)
    pub fn get_listing_txn(
        &self,
        txn: &WriteTransaction,
        listing_id: &str,
    ) -> StorageResult<Option<Listing>> {
        let table = txn.open_table(LISTINGS_TABLE)?;
        match table.get(listing_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List active listings, optionally filtered by category
    pub fn list_active_listings(&self, category: Option<&str>) -> StorageResult<Vec<Listing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTINGS_TABLE)?;

        let mut listings = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let listing: Listing = serde_json::from_slice(value.value())?;
            if listing.status != ListingStatus::Active {
                continue;
            }
            if let Some(cat) = category
                && listing.category != cat
            {
                continue;
            }
            listings.push(listing);
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    /// List every listing owned by a seller
    pub fn list_listings_for_seller(&self, seller_id: &str) -> StorageResult<Vec<Listing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTINGS_TABLE)?;

        let mut listings = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let listing: Listing = serde_json::from_slice(value.value())?;
            if listing.seller_id == seller_id {
                listings.push(listing);
            }
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    /// Bump the view counter and return the updated listing
    pub fn increment_listing_views(&self, listing_id: &str) -> StorageResult<Option<Listing>> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(LISTINGS_TABLE)?;
            let listing_opt = match table.get(listing_id)? {
                Some(value) => Some(serde_json::from_slice::<Listing>(value.value())?),
                None => None,
            };
            match listing_opt {
                Some(mut listing) => {
                    listing.views_count += 1;
                    let value = serde_json::to_vec(&listing)?;
                    table.insert(listing_id, value.as_slice())?;
                    Some(listing)
                }
                None => None,
            }
        };
        txn.commit()?;
        Ok(updated)
    }

    // ========== Offers ==========

    /// Store an offer (insert or overwrite)
    pub fn store_offer(&self, txn: &WriteTransaction, offer: &Offer) -> StorageResult<()> {
        let mut table = txn.open_table(OFFERS_TABLE)?;
        let value = serde_json::to_vec(offer)?;
        table.insert(offer.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Insert the listing/buyer indexes and the expiry queue entry for a new offer
    pub fn index_offer(&self, txn: &WriteTransaction, offer: &Offer) -> StorageResult<()> {
        {
            let mut table = txn.open_table(OFFERS_BY_LISTING_TABLE)?;
            table.insert((offer.listing_id.as_str(), offer.id.as_str()), ())?;
        }
        {
            let mut table = txn.open_table(OFFERS_BY_BUYER_TABLE)?;
            table.insert((offer.buyer_id.as_str(), offer.id.as_str()), ())?;
        }
        {
            let mut table = txn.open_table(OFFER_EXPIRY_TABLE)?;
            table.insert((offer.expires_at.timestamp_millis(), offer.id.as_str()), ())?;
        }
        Ok(())
    }

    /// Remove an offer's expiry queue entry once it leaves `pending`
    pub fn clear_offer_expiry(&self, txn: &WriteTransaction, offer: &Offer) -> StorageResult<()> {
        let mut table = txn.open_table(OFFER_EXPIRY_TABLE)?;
        table.remove((offer.expires_at.timestamp_millis(), offer.id.as_str()))?;
        Ok(())
    }

    /// Get an offer by ID
    pub fn get_offer(&self, offer_id: &str) -> StorageResult<Option<Offer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OFFERS_TABLE)?;
        match table.get(offer_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an offer by ID (within transaction)
    pub fn get_offer_txn(
        &self,
        txn: &WriteTransaction,
        offer_id: &str,
    ) -> StorageResult<Option<Offer>> {
        let table = txn.open_table(OFFERS_TABLE)?;
        match table.get(offer_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List all offers made against a listing, newest first
    pub fn list_offers_for_listing(&self, listing_id: &str) -> StorageResult<Vec<Offer>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(OFFERS_BY_LISTING_TABLE)?;
        let offers_table = read_txn.open_table(OFFERS_TABLE)?;

        let mut offers = Vec::new();
        let range_start = (listing_id, "");
        let range_end = (listing_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let offer_id = key.value().1;
            if let Some(value) = offers_table.get(offer_id)? {
                offers.push(serde_json::from_slice::<Offer>(value.value())?);
            }
        }

        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    /// List all offers made by a buyer, newest first
    pub fn list_offers_for_buyer(&self, buyer_id: &str) -> StorageResult<Vec<Offer>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(OFFERS_BY_BUYER_TABLE)?;
        let offers_table = read_txn.open_table(OFFERS_TABLE)?;

        let mut offers = Vec::new();
        let range_start = (buyer_id, "");
        let range_end = (buyer_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let offer_id = key.value().1;
            if let Some(value) = offers_table.get(offer_id)? {
                offers.push(serde_json::from_slice::<Offer>(value.value())?);
            }
        }

        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    /// Pending offers whose expiry time has passed (within transaction)
    ///
    /// The expiry queue may briefly contain entries for offers that already
    /// left `pending`; the status is re-checked here.
    pub fn expired_pending_offers_txn(
        &self,
        txn: &WriteTransaction,
        now_millis: i64,
    ) -> StorageResult<Vec<Offer>> {
        let queue = txn.open_table(OFFER_EXPIRY_TABLE)?;
        let offers_table = txn.open_table(OFFERS_TABLE)?;

        let mut expired = Vec::new();
        let range_start = (i64::MIN, "");
        let range_end = (now_millis + 1, "");
        for result in queue.range(range_start..range_end)? {
            let (key, _) = result?;
            let offer_id = key.value().1;
            if let Some(value) = offers_table.get(offer_id)? {
                let offer: Offer = serde_json::from_slice(value.value())?;
                if offer.status == OfferStatus::Pending {
                    expired.push(offer);
                }
            }
        }
        Ok(expired)
    }

    // ========== Orders ==========

    /// Store an order (insert or overwrite)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Index a new order for both participants
    pub fn index_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_BY_USER_TABLE)?;
        table.insert((order.buyer_id.as_str(), order.id.as_str()), ())?;
        table.insert((order.seller_id.as_str(), order.id.as_str()), ())?;
        Ok(())
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List all orders a user participates in, newest first
    pub fn list_orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDERS_BY_USER_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let order_id = key.value().1;
            if let Some(value) = orders_table.get(order_id)? {
                orders.push(serde_json::from_slice::<Order>(value.value())?);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    // ========== Payments ==========

    /// Store a payment attempt (insert or overwrite)
    pub fn store_payment(&self, txn: &WriteTransaction, payment: &Payment) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(payment)?;
        table.insert(
            (payment.order_id.as_str(), payment.id.as_str()),
            value.as_slice(),
        )?;
        Ok(())
    }

    /// All payment attempts for an order
    pub fn list_payments_for_order(&self, order_id: &str) -> StorageResult<Vec<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        let mut payments = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            payments.push(serde_json::from_slice::<Payment>(value.value())?);
        }
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(payments)
    }

    /// All payment attempts for an order (within transaction)
    pub fn list_payments_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<Payment>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        let mut payments = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            payments.push(serde_json::from_slice::<Payment>(value.value())?);
        }
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(payments)
    }

    // ========== Shipments ==========

    /// Store the shipment for an order (insert or overwrite)
    pub fn store_shipment(
        &self,
        txn: &WriteTransaction,
        shipment: &Shipment,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SHIPMENTS_TABLE)?;
        let value = serde_json::to_vec(shipment)?;
        table.insert(shipment.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get the shipment for an order
    pub fn get_shipment(&self, order_id: &str) -> StorageResult<Option<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the shipment for an order (within transaction)
    pub fn get_shipment_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Shipment>> {
        let table = txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Disputes ==========

    /// Store a dispute (insert or overwrite)
    pub fn store_dispute(&self, txn: &WriteTransaction, dispute: &Dispute) -> StorageResult<()> {
        let mut table = txn.open_table(DISPUTES_TABLE)?;
        let value = serde_json::to_vec(dispute)?;
        table.insert(dispute.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Index a new dispute for both participants
    pub fn index_dispute(&self, txn: &WriteTransaction, dispute: &Dispute) -> StorageResult<()> {
        let mut table = txn.open_table(DISPUTES_BY_USER_TABLE)?;
        table.insert((dispute.raised_by_user_id.as_str(), dispute.id.as_str()), ())?;
        table.insert(
            (dispute.respondent_user_id.as_str(), dispute.id.as_str()),
            (),
        )?;
        Ok(())
    }

    /// Get a dispute by ID
    pub fn get_dispute(&self, dispute_id: &str) -> StorageResult<Option<Dispute>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DISPUTES_TABLE)?;
        match table.get(dispute_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a dispute by ID (within transaction)
    pub fn get_dispute_txn(
        &self,
        txn: &WriteTransaction,
        dispute_id: &str,
    ) -> StorageResult<Option<Dispute>> {
        let table = txn.open_table(DISPUTES_TABLE)?;
        match table.get(dispute_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List disputes a user is involved in, newest first
    pub fn list_disputes_for_user(&self, user_id: &str) -> StorageResult<Vec<Dispute>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(DISPUTES_BY_USER_TABLE)?;
        let disputes_table = read_txn.open_table(DISPUTES_TABLE)?;

        let mut disputes = Vec::new();
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let dispute_id = key.value().1;
            if let Some(value) = disputes_table.get(dispute_id)? {
                disputes.push(serde_json::from_slice::<Dispute>(value.value())?);
            }
        }

        disputes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(disputes)
    }

    // ========== Reviews ==========

    /// Store a review and both of its indexes
    pub fn store_review(&self, txn: &WriteTransaction, review: &Review) -> StorageResult<()> {
        {
            let mut table = txn.open_table(REVIEWS_TABLE)?;
            let value = serde_json::to_vec(review)?;
            table.insert(review.id.as_str(), value.as_slice())?;
        }
        {
            let mut table = txn.open_table(REVIEWS_BY_ORDER_TABLE)?;
            table.insert(
                (review.order_id.as_str(), review.from_user_id.as_str()),
                review.id.as_str(),
            )?;
        }
        {
            let mut table = txn.open_table(REVIEWS_BY_USER_TABLE)?;
            table.insert((review.to_user_id.as_str(), review.id.as_str()), ())?;
        }
        Ok(())
    }

    /// Whether an author already reviewed an order
    pub fn review_exists(&self, order_id: &str, from_user_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REVIEWS_BY_ORDER_TABLE)?;
        Ok(table.get((order_id, from_user_id))?.is_some())
    }

    /// Whether an author already reviewed an order (within transaction)
    pub fn review_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        from_user_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(REVIEWS_BY_ORDER_TABLE)?;
        Ok(table.get((order_id, from_user_id))?.is_some())
    }

    /// Reviews received by a user, newest first
    pub fn list_reviews_for_user(&self, to_user_id: &str) -> StorageResult<Vec<Review>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(REVIEWS_BY_USER_TABLE)?;
        let reviews_table = read_txn.open_table(REVIEWS_TABLE)?;

        let mut reviews = Vec::new();
        let range_start = (to_user_id, "");
        let range_end = (to_user_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let review_id = key.value().1;
            if let Some(value) = reviews_table.get(review_id)? {
                reviews.push(serde_json::from_slice::<Review>(value.value())?);
            }
        }

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    // ========== Threads & Messages ==========

    /// Store a thread (insert or overwrite)
    pub fn store_thread(&self, txn: &WriteTransaction, thread: &Thread) -> StorageResult<()> {
        let mut table = txn.open_table(THREADS_TABLE)?;
        let value = serde_json::to_vec(thread)?;
        table.insert(thread.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Index a new thread for both participants and the dedup lookup
    pub fn index_thread(&self, txn: &WriteTransaction, thread: &Thread) -> StorageResult<()> {
        {
            let mut table = txn.open_table(THREADS_BY_USER_TABLE)?;
            table.insert((thread.buyer_id.as_str(), thread.id.as_str()), ())?;
            table.insert((thread.seller_id.as_str(), thread.id.as_str()), ())?;
        }
        {
            let mut table = txn.open_table(THREAD_LOOKUP_TABLE)?;
            let listing = thread.listing_id.as_deref().unwrap_or("");
            table.insert(
                (thread.buyer_id.as_str(), thread.seller_id.as_str(), listing),
                thread.id.as_str(),
            )?;
        }
        Ok(())
    }

    /// Find the existing thread for a (buyer, seller, listing) triple (within transaction)
    pub fn find_thread_txn(
        &self,
        txn: &WriteTransaction,
        buyer_id: &str,
        seller_id: &str,
        listing_id: Option<&str>,
    ) -> StorageResult<Option<Thread>> {
        let lookup = txn.open_table(THREAD_LOOKUP_TABLE)?;
        let listing = listing_id.unwrap_or("");
        let thread_id = match lookup.get((buyer_id, seller_id, listing))? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(lookup);
        self.get_thread_txn(txn, &thread_id)
    }

    /// Get a thread by ID
    pub fn get_thread(&self, thread_id: &str) -> StorageResult<Option<Thread>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THREADS_TABLE)?;
        match table.get(thread_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a thread by ID (within transaction)
    pub fn get_thread_txn(
        &self,
        txn: &WriteTransaction,
        thread_id: &str,
    ) -> StorageResult<Option<Thread>> {
        let table = txn.open_table(THREADS_TABLE)?;
        match table.get(thread_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List a user's threads, most recently active first
    pub fn list_threads_for_user(&self, user_id: &str) -> StorageResult<Vec<Thread>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(THREADS_BY_USER_TABLE)?;
        let threads_table = read_txn.open_table(THREADS_TABLE)?;

        let mut threads = Vec::new();
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let thread_id = key.value().1;
            if let Some(value) = threads_table.get(thread_id)? {
                threads.push(serde_json::from_slice::<Thread>(value.value())?);
            }
        }

        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    /// Store a message (insert or overwrite)
    pub fn store_message(&self, txn: &WriteTransaction, message: &Message) -> StorageResult<()> {
        let mut table = txn.open_table(MESSAGES_TABLE)?;
        let value = serde_json::to_vec(message)?;
        table.insert(
            (message.thread_id.as_str(), message.id.as_str()),
            value.as_slice(),
        )?;
        Ok(())
    }

    /// All messages in a thread, oldest first
    pub fn list_messages(&self, thread_id: &str) -> StorageResult<Vec<Message>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;

        let mut messages = Vec::new();
        let range_start = (thread_id, "");
        let range_end = (thread_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            messages.push(serde_json::from_slice::<Message>(value.value())?);
        }

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    /// Mark every message sent to `reader_id` in a thread as read.
    /// Returns the number of messages updated.
    pub fn mark_thread_messages_read(
        &self,
        thread_id: &str,
        reader_id: &str,
    ) -> StorageResult<usize> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(MESSAGES_TABLE)?;

            let mut to_update: Vec<Message> = Vec::new();
            let range_start = (thread_id, "");
            let range_end = (thread_id, "\u{10FFFF}");
            for result in table.range(range_start..=range_end)? {
                let (_key, value) = result?;
                let message: Message = serde_json::from_slice(value.value())?;
                if message.from_user_id != reader_id && !message.is_read {
                    to_update.push(message);
                }
            }

            for message in &mut to_update {
                message.is_read = true;
                let value = serde_json::to_vec(&message)?;
                table.insert(
                    (message.thread_id.as_str(), message.id.as_str()),
                    value.as_slice(),
                )?;
            }
            to_update.len()
        };
        txn.commit()?;
        Ok(updated)
    }

    // ========== Notifications ==========

    /// Persist a notification (own transaction; called from the notify worker)
    pub fn insert_notification(&self, notification: &Notification) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(NOTIFICATIONS_TABLE)?;
            let value = serde_json::to_vec(notification)?;
            table.insert(
                (notification.user_id.as_str(), notification.id.as_str()),
                value.as_slice(),
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// A user's notifications, newest first
    pub fn list_notifications(&self, user_id: &str) -> StorageResult<Vec<Notification>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTIFICATIONS_TABLE)?;

        let mut notifications = Vec::new();
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            notifications.push(serde_json::from_slice::<Notification>(value.value())?);
        }

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    /// Count of a user's unread notifications
    pub fn unread_notification_count(&self, user_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTIFICATIONS_TABLE)?;

        let mut count = 0u64;
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let notification: Notification = serde_json::from_slice(value.value())?;
            if !notification.is_read {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Mark one notification read. Returns false when it does not exist.
    pub fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let found = {
            let mut table = txn.open_table(NOTIFICATIONS_TABLE)?;
            let existing = match table.get((user_id, notification_id))? {
                Some(value) => Some(serde_json::from_slice::<Notification>(value.value())?),
                None => None,
            };
            match existing {
                Some(mut notification) => {
                    notification.is_read = true;
                    let value = serde_json::to_vec(&notification)?;
                    table.insert((user_id, notification_id), value.as_slice())?;
                    true
                }
                None => false,
            }
        };
        txn.commit()?;
        Ok(found)
    }

    /// Mark all of a user's notifications read. Returns the number updated.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> StorageResult<usize> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(NOTIFICATIONS_TABLE)?;

            let mut to_update: Vec<Notification> = Vec::new();
            let range_start = (user_id, "");
            let range_end = (user_id, "\u{10FFFF}");
            for result in table.range(range_start..=range_end)? {
                let (_key, value) = result?;
                let notification: Notification = serde_json::from_slice(value.value())?;
                if !notification.is_read {
                    to_update.push(notification);
                }
            }

            for notification in &mut to_update {
                notification.is_read = true;
                let value = serde_json::to_vec(&notification)?;
                table.insert(
                    (notification.user_id.as_str(), notification.id.as_str()),
                    value.as_slice(),
                )?;
            }
            to_update.len()
        };
        txn.commit()?;
        Ok(updated)
    }

    // ========== Audit Logs ==========

    /// Persist an audit record (own transaction; called from the audit worker)
    pub fn insert_audit_log(&self, entry: &AuditLog) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(AUDIT_LOGS_TABLE)?;
            let key = entity_key(entry.entity_type, &entry.entity_id);
            let value = serde_json::to_vec(entry)?;
            table.insert((key.as_str(), entry.id.as_str()), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Audit trail for one entity, oldest first
    pub fn list_audit_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> StorageResult<Vec<AuditLog>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOGS_TABLE)?;

        let key = entity_key(kind, entity_id);
        let mut entries = Vec::new();
        let range_start = (key.as_str(), "");
        let range_end = (key.as_str(), "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice::<AuditLog>(value.value())?);
        }

        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    // ========== Payouts ==========

    /// Store a payout ledger entry (insert or overwrite)
    pub fn store_payout(&self, txn: &WriteTransaction, payout: &Payout) -> StorageResult<()> {
        let mut table = txn.open_table(PAYOUTS_TABLE)?;
        let value = serde_json::to_vec(payout)?;
        table.insert(
            (payout.seller_id.as_str(), payout.id.as_str()),
            value.as_slice(),
        )?;
        Ok(())
    }

    /// A seller's payouts, newest first
    pub fn list_payouts_for_seller(&self, seller_id: &str) -> StorageResult<Vec<Payout>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYOUTS_TABLE)?;

        let mut payouts = Vec::new();
        let range_start = (seller_id, "");
        let range_end = (seller_id, "\u{10FFFF}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            payouts.push(serde_json::from_slice::<Payout>(value.value())?);
        }

        payouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payouts)
    }

    // ========== Statistics ==========

    /// Entity counts, logged at startup
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let listings = read_txn.open_table(LISTINGS_TABLE)?;
        let offers = read_txn.open_table(OFFERS_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        let disputes = read_txn.open_table(DISPUTES_TABLE)?;
        let commands = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

        Ok(StorageStats {
            listing_count: listings.len()?,
            offer_count: offers.len()?,
            order_count: orders.len()?,
            dispute_count: disputes.len()?,
            processed_command_count: commands.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub listing_count: u64,
    pub offer_count: u64,
    pub order_count: u64,
    pub dispute_count: u64,
    pub processed_command_count: u64,
}
