use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::accounts::{AccountError, AccountService};
use super::agreements::{AgreementError, AgreementService};
use super::availability::{AvailabilityEngine, AvailabilityError};
use super::contract::{
    ContractError, ContractService, ContractTemplater, DocumentConverter, IdentityConverter,
    TokenTemplater, DEFAULT_TEMPLATE,
};
use super::domain::{
    AgreementId, AgreementTerms, DateRange, ImageId, ListingId, ListingPatch, MessageId,
    NewImage, NewListing, NewMessage, NewUser, User, UserId,
};
use super::geocode::{Geocoder, NoGeocoder};
use super::lease::{check_sublease_terms, LeaseAnalyzer, OfflineAnalyzer};
use super::listings::{ListingError, ListingService};
use super::messages::{MessageError, MessageService};
use super::store::{AgreementFilter, ListingFilter, MarketStore, MessageFilter, UserFilter};

/// Upload cap covering gallery photos and lease documents.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// External collaborators the marketplace delegates to.
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub templater: Arc<dyn ContractTemplater>,
    pub converter: Arc<dyn DocumentConverter>,
    pub lease_analyzer: Arc<dyn LeaseAnalyzer>,
    pub contract_template: Vec<u8>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            geocoder: Arc::new(NoGeocoder),
            templater: Arc::new(TokenTemplater),
            converter: Arc::new(IdentityConverter),
            lease_analyzer: Arc::new(OfflineAnalyzer),
            contract_template: DEFAULT_TEMPLATE.as_bytes().to_vec(),
        }
    }
}

/// Shared handler state: one service per concern, all over the same store.
pub struct MarketState<S> {
    pub accounts: AccountService<S>,
    pub listings: ListingService<S>,
    pub agreements: AgreementService<S>,
    pub availability: AvailabilityEngine<S>,
    pub messages: MessageService<S>,
    pub contracts: ContractService<S>,
    pub lease_analyzer: Arc<dyn LeaseAnalyzer>,
}

impl<S: MarketStore> MarketState<S> {
    pub fn new(store: Arc<S>, collaborators: Collaborators) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            listings: ListingService::new(store.clone(), collaborators.geocoder),
            agreements: AgreementService::new(store.clone()),
            availability: AvailabilityEngine::new(store.clone()),
            messages: MessageService::new(store.clone()),
            contracts: ContractService::new(
                store,
                collaborators.templater,
                collaborators.converter,
                collaborators.contract_template,
            ),
            lease_analyzer: collaborators.lease_analyzer,
        }
    }
}

/// Router builder exposing the full marketplace HTTP surface.
pub fn market_router<S: MarketStore + 'static>(state: Arc<MarketState<S>>) -> Router {
    Router::new()
        .route("/signup", post(signup_handler::<S>))
        .route("/login", post(login_handler::<S>))
        .route("/users", get(users_handler::<S>))
        .route("/users/:id", delete(delete_user_handler::<S>))
        .route(
            "/users/:id/image",
            get(profile_image_handler::<S>).put(put_profile_image_handler::<S>),
        )
        .route(
            "/listings",
            get(listings_handler::<S>).post(create_listing_handler::<S>),
        )
        .route("/listings/saved/:id", get(saved_listings_handler::<S>))
        .route(
            "/listings/:id",
            delete(delete_listing_handler::<S>).patch(update_listing_handler::<S>),
        )
        .route(
            "/listings/:id/save",
            post(save_listing_handler::<S>).delete(unsave_listing_handler::<S>),
        )
        .route("/listings/:id/images", post(add_listing_image_handler::<S>))
        .route(
            "/listings/:id/images/:image_id",
            get(listing_image_handler::<S>),
        )
        .route("/listings/:id/availability", get(availability_handler::<S>))
        .route("/listings/:id/accept", post(accept_handler::<S>))
        .route("/agreements", get(agreements_handler::<S>))
        .route("/agreements/:id", delete(delete_agreement_handler::<S>))
        .route("/agreements/:id/sign", post(sign_handler::<S>))
        .route("/agreements/:id/contract", get(contract_handler::<S>))
        .route(
            "/messages",
            get(messages_handler::<S>).post(send_message_handler::<S>),
        )
        .route("/messages/:id", delete(delete_message_handler::<S>))
        .route("/lease/check", post(lease_check_handler::<S>))
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

fn error_body(message: impl ToString) -> Json<serde_json::Value> {
    Json(json!({ "error": message.to_string() }))
}

fn account_response(err: AccountError) -> Response {
    let status = match &err {
        AccountError::Validation(_) => StatusCode::BAD_REQUEST,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err)).into_response()
}

fn listing_response(err: ListingError) -> Response {
    let status = match &err {
        ListingError::Validation(_) => StatusCode::BAD_REQUEST,
        ListingError::NotFound(_) => StatusCode::NOT_FOUND,
        ListingError::Forbidden => StatusCode::FORBIDDEN,
        ListingError::Conflict(_) => StatusCode::CONFLICT,
        ListingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err)).into_response()
}

fn agreement_response(err: AgreementError) -> Response {
    let status = match &err {
        AgreementError::Validation(_) => StatusCode::BAD_REQUEST,
        AgreementError::NotFound(_) => StatusCode::NOT_FOUND,
        AgreementError::Forbidden => StatusCode::FORBIDDEN,
        AgreementError::Conflict(_) => StatusCode::CONFLICT,
        AgreementError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err)).into_response()
}

fn availability_response(err: AvailabilityError) -> Response {
    let status = match &err {
        AvailabilityError::NotFound => StatusCode::NOT_FOUND,
        AvailabilityError::InvalidRange => StatusCode::BAD_REQUEST,
        AvailabilityError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err)).into_response()
}

fn message_response(err: MessageError) -> Response {
    let status = match &err {
        MessageError::Validation(_) => StatusCode::BAD_REQUEST,
        MessageError::NotFound(_) => StatusCode::NOT_FOUND,
        MessageError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err)).into_response()
}

fn contract_response(err: ContractError) -> Response {
    let status = match &err {
        ContractError::NotFound(_) => StatusCode::NOT_FOUND,
        ContractError::Template(_) | ContractError::Convert(_) | ContractError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, error_body(err)).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingQuery {
    listing_id: Option<String>,
    owner_id: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgreementQuery {
    agreement_id: Option<String>,
    owner_id: Option<String>,
    tenant_id: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorQuery {
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadQuery {
    user_id: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityQuery {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractQuery {
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    user_id: UserId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    participant: Option<String>,
}

/// Optional date-range filter; both bounds or neither.
fn range_filter(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<DateRange>, Response> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) if from <= to => Ok(Some(DateRange::new(from, to))),
        (Some(_), Some(_)) => Err((
            StatusCode::BAD_REQUEST,
            error_body("from must not come after to"),
        )
            .into_response()),
        _ => Err((
            StatusCode::BAD_REQUEST,
            error_body("from and to must be provided together"),
        )
            .into_response()),
    }
}

fn image_from_upload(
    headers: &HeaderMap,
    filename: Option<String>,
    body: Bytes,
) -> Result<NewImage, Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let filename = filename.unwrap_or_else(|| "upload".to_string());
    NewImage::new(body.to_vec(), content_type, &filename)
        .map_err(|err| (StatusCode::BAD_REQUEST, error_body(err)).into_response())
}

async fn signup_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Json(new): Json<NewUser>,
) -> Response {
    match state.accounts.signup(new) {
        Ok(user) => (StatusCode::CREATED, Json(user.view())).into_response(),
        Err(err) => account_response(err),
    }
}

async fn login_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state.accounts.login(&request.email, &request.password) {
        Ok(user) => Json(user.view()).into_response(),
        Err(err) => account_response(err),
    }
}

async fn users_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Query(query): Query<UserQuery>,
) -> Response {
    let filter = UserFilter {
        id: query.user_id.map(UserId),
    };
    match state.accounts.list(&filter) {
        Ok(users) => Json(users.iter().map(User::view).collect::<Vec<_>>()).into_response(),
        Err(err) => account_response(err),
    }
}

async fn delete_user_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.accounts.delete(&UserId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => account_response(err),
    }
}

async fn put_profile_image_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let image = match image_from_upload(&headers, query.filename, body) {
        Ok(image) => image,
        Err(response) => return response,
    };
    match state.accounts.set_profile_image(&UserId(id), image) {
        Ok(record) => Json(json!({ "imageId": record.id })).into_response(),
        Err(err) => account_response(err),
    }
}

async fn profile_image_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.accounts.profile_image(&UserId(id)) {
        Ok(image) => ([(header::CONTENT_TYPE, image.content_type)], image.data).into_response(),
        Err(err) => account_response(err),
    }
}

async fn listings_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let range = match range_filter(query.from, query.to) {
        Ok(range) => range,
        Err(response) => return response,
    };
    // An explicit listing id wins over an owner filter.
    let filter = ListingFilter {
        id: query.listing_id.clone().map(ListingId),
        owner: if query.listing_id.is_none() {
            query.owner_id.map(UserId)
        } else {
            None
        },
        range,
    };
    match state.listings.list(&filter) {
        Ok(listings) => Json(listings).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn create_listing_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Json(new): Json<NewListing>,
) -> Response {
    match state.listings.create(new).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn update_listing_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(actor): Query<ActorQuery>,
    Json(patch): Json<ListingPatch>,
) -> Response {
    match state
        .listings
        .update(&ListingId(id), &UserId(actor.user_id), patch)
        .await
    {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn delete_listing_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Response {
    match state
        .listings
        .delete(&ListingId(id), &UserId(actor.user_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => listing_response(err),
    }
}

async fn saved_listings_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.listings.saved(&UserId(id)) {
        Ok(listings) => Json(listings).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn save_listing_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Response {
    match state.listings.save(&UserId(actor.user_id), &ListingId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => listing_response(err),
    }
}

async fn unsave_listing_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Response {
    match state
        .listings
        .unsave(&UserId(actor.user_id), &ListingId(id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => listing_response(err),
    }
}

async fn add_listing_image_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(actor) = query.user_id.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            error_body("userId query parameter is required"),
        )
            .into_response();
    };
    let image = match image_from_upload(&headers, query.filename, body) {
        Ok(image) => image,
        Err(response) => return response,
    };
    match state
        .listings
        .add_image(&ListingId(id), &UserId(actor), image)
    {
        Ok(record) => (StatusCode::CREATED, Json(json!({ "imageId": record.id }))).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn listing_image_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path((id, image_id)): Path<(String, String)>,
) -> Response {
    match state.listings.image(&ListingId(id), &ImageId(image_id)) {
        Ok(image) => ([(header::CONTENT_TYPE, image.content_type)], image.data).into_response(),
        Err(err) => listing_response(err),
    }
}

async fn availability_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    let range = DateRange::new(query.start, query.end);
    match state.availability.check(&ListingId(id), range) {
        Ok(available) => Json(json!({ "available": available })).into_response(),
        Err(err) => availability_response(err),
    }
}

async fn accept_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Json(terms): Json<AgreementTerms>,
) -> Response {
    match state.agreements.create(&ListingId(id), terms) {
        Ok(agreement) => (StatusCode::CREATED, Json(agreement)).into_response(),
        Err(err) => agreement_response(err),
    }
}

async fn agreements_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Query(query): Query<AgreementQuery>,
) -> Response {
    let range = match range_filter(query.from, query.to) {
        Ok(range) => range,
        Err(response) => return response,
    };
    let by_id = query.agreement_id.is_some();
    let filter = AgreementFilter {
        id: query.agreement_id.map(AgreementId),
        owner: if by_id { None } else { query.owner_id.map(UserId) },
        tenant: if by_id { None } else { query.tenant_id.map(UserId) },
        range,
    };
    match state.agreements.list(&filter) {
        Ok(agreements) => Json(agreements).into_response(),
        Err(err) => agreement_response(err),
    }
}

async fn sign_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Json(request): Json<SignRequest>,
) -> Response {
    match state
        .agreements
        .sign(&AgreementId(id), &request.user_id, Utc::now())
    {
        Ok(agreement) => Json(agreement).into_response(),
        Err(err) => agreement_response(err),
    }
}

async fn delete_agreement_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.agreements.delete(&AgreementId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => agreement_response(err),
    }
}

async fn contract_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<ContractQuery>,
) -> Response {
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match state.contracts.render(&AgreementId(id), today).await {
        Ok(document) => (
            [(header::CONTENT_TYPE, state.contracts.output_content_type())],
            document,
        )
            .into_response(),
        Err(err) => contract_response(err),
    }
}

async fn messages_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let filter = MessageFilter {
        participant: query.participant.map(UserId),
    };
    match state.messages.list(&filter) {
        Ok(messages) => Json(messages).into_response(),
        Err(err) => message_response(err),
    }
}

async fn send_message_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Json(new): Json<NewMessage>,
) -> Response {
    match state.messages.send(new, Utc::now()) {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(err) => message_response(err),
    }
}

async fn delete_message_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.messages.delete(&MessageId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => message_response(err),
    }
}

async fn lease_check_handler<S: MarketStore>(
    State(state): State<Arc<MarketState<S>>>,
    body: Bytes,
) -> Response {
    let verdict = check_sublease_terms(state.lease_analyzer.as_ref(), &body).await;
    Json(verdict).into_response()
}

async fn fallback_handler() -> Response {
    (StatusCode::NOT_FOUND, error_body("no such route")).into_response()
}
