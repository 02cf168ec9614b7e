use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::engine::LedgerEngine;
use crate::error::LedgerError;
use crate::forms::{PersonEditForm, PersonForm, RecordForm};
use crate::schemas::{PersonId, RecordId};

#[post("/person")]
async fn add_person(
    engine: web::Data<LedgerEngine>,
    form: web::Json<PersonForm>,
) -> Result<HttpResponse, LedgerError> {
    let name = form.validate()?;
    let person = engine.create_person(&name).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "person": person })))
}

#[post("/person/edit/{id}")]
async fn edit_person(
    engine: web::Data<LedgerEngine>,
    id: web::Path<PersonId>,
    form: web::Json<PersonEditForm>,
) -> Result<HttpResponse, LedgerError> {
    let (name, color) = form.validate()?;
    engine.update_person(id.into_inner(), &name, &color).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/record")]
async fn add_record(
    engine: web::Data<LedgerEngine>,
    form: web::Json<RecordForm>,
) -> Result<HttpResponse, LedgerError> {
    let record = engine.create_record(form.validate()?).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "record": record })))
}

#[post("/record/edit/{id}")]
async fn edit_record(
    engine: web::Data<LedgerEngine>,
    id: web::Path<RecordId>,
    form: web::Json<RecordForm>,
) -> Result<HttpResponse, LedgerError> {
    engine
        .update_record(id.into_inner(), form.validate()?)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/record/delete/{id}")]
async fn delete_record(
    engine: web::Data<LedgerEngine>,
    id: web::Path<RecordId>,
) -> Result<HttpResponse, LedgerError> {
    engine.delete_record(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/record/togglePaid/{id}")]
async fn toggle_paid(
    engine: web::Data<LedgerEngine>,
    id: web::Path<RecordId>,
) -> Result<HttpResponse, LedgerError> {
    let is_paid = engine.toggle_paid(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "isPaid": is_paid })))
}

#[get("/")]
async fn overview(engine: web::Data<LedgerEngine>) -> Result<HttpResponse, LedgerError> {
    Ok(HttpResponse::Ok().json(engine.overview().await?))
}

/// Registers every ledger route. Malformed JSON bodies and path ids get
/// the same failure shape as rejected input.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| LedgerError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| LedgerError::Validation(err.to_string()).into()),
    )
    .service(add_person)
    .service(edit_person)
    .service(add_record)
    .service(edit_record)
    .service(delete_record)
    .service(toggle_paid)
    .service(overview);
}
