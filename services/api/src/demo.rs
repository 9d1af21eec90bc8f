use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use sublet_market::error::AppError;
use sublet_market::marketplace::accounts::AccountService;
use sublet_market::marketplace::agreements::AgreementService;
use sublet_market::marketplace::availability::AvailabilityEngine;
use sublet_market::marketplace::contract::{
    ContractService, IdentityConverter, TokenTemplater, DEFAULT_TEMPLATE,
};
use sublet_market::marketplace::domain::{AgreementTerms, DateRange, NewListing, NewUser, UserId};
use sublet_market::marketplace::geocode::NoGeocoder;
use sublet_market::marketplace::listings::ListingService;
use sublet_market::marketplace::store::InMemoryStore;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Start of the demo listing's availability window (YYYY-MM-DD).
    /// Defaults to the next January 1st.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) window_start: Option<NaiveDate>,
}

fn demo_window(start: Option<NaiveDate>) -> DateRange {
    let start = start.unwrap_or_else(|| {
        let today = Local::now().date_naive();
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).expect("january exists")
    });
    let end = start
        .checked_add_months(chrono::Months::new(5))
        .expect("window end computes");
    DateRange::new(start, end)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryStore::new());
    let accounts = AccountService::new(store.clone());
    let listings = ListingService::new(store.clone(), Arc::new(NoGeocoder));
    let agreements = AgreementService::new(store.clone());
    let availability = AvailabilityEngine::new(store.clone());
    let contracts = ContractService::new(
        store.clone(),
        Arc::new(TokenTemplater),
        Arc::new(IdentityConverter),
        DEFAULT_TEMPLATE.as_bytes().to_vec(),
    );

    println!("== Sublet Market demo ==\n");

    let owner = accounts
        .signup(NewUser {
            name: "John Doe".to_string(),
            email: "john@example.edu".to_string(),
            password: "demo".to_string(),
            wallet_address: None,
            zipcode: Some("53703".to_string()),
        })
        .map_err(demo_failure)?;
    let tenant = accounts
        .signup(NewUser {
            name: "Alice Smith".to_string(),
            email: "alice@example.edu".to_string(),
            password: "demo".to_string(),
            wallet_address: None,
            zipcode: None,
        })
        .map_err(demo_failure)?;
    println!("signed up {} and {}", owner.name, tenant.name);

    let window = demo_window(args.window_start);
    let listing = listings
        .create(NewListing {
            title: "Sunny room near campus".to_string(),
            description: Some("Third floor, on the bus line".to_string()),
            address: "123 State St, Madison WI".to_string(),
            website: None,
            rent: 1100,
            security_deposit: Some(1100),
            window,
            capacity: 2,
            owner: owner.id.clone(),
        })
        .await
        .map_err(demo_failure)?;
    println!(
        "posted '{}' available {} to {}",
        listing.title, listing.window.start, listing.window.end
    );

    let term = DateRange::new(
        listing.window.start,
        listing
            .window
            .start
            .checked_add_months(chrono::Months::new(2))
            .expect("term end computes"),
    );
    let open = availability
        .check(&listing.id, term)
        .map_err(demo_failure)?;
    println!(
        "availability {} to {}: {}",
        term.start,
        term.end,
        if open { "open" } else { "taken" }
    );

    let agreement = agreements
        .create(
            &listing.id,
            AgreementTerms {
                start_date: Some(term.start),
                end_date: Some(term.end),
                owner: Some(owner.id.clone()),
                tenant: Some(tenant.id.clone()),
                num_people: Some(1),
                ..AgreementTerms::default()
            },
        )
        .map_err(demo_failure)?;
    println!(
        "agreement {} reserved (deposit ${} via listing default)",
        agreement.id.0, agreement.security_deposit
    );

    let clash = agreements.create(
        &listing.id,
        AgreementTerms {
            start_date: Some(term.end),
            end_date: Some(listing.window.end),
            owner: Some(owner.id.clone()),
            tenant: Some(tenant.id.clone()),
            num_people: Some(1),
            ..AgreementTerms::default()
        },
    );
    match clash {
        Err(err) => println!("boundary-touching follow-up rejected: {err}"),
        Ok(_) => println!("unexpected: conflicting reservation landed"),
    }

    agreements
        .sign(&agreement.id, &owner.id, Utc::now())
        .map_err(demo_failure)?;
    let signed = agreements
        .sign(&agreement.id, &tenant.id, Utc::now())
        .map_err(demo_failure)?;
    println!(
        "both parties signed; fully signed: {}",
        signed.is_fully_signed()
    );

    let stranger = agreements.sign(&agreement.id, &UserId("user-999999".to_string()), Utc::now());
    if let Err(err) = stranger {
        println!("stranger signing rejected: {err}");
    }

    let document = contracts
        .render(&agreement.id, Local::now().date_naive())
        .await
        .map_err(demo_failure)?;
    println!("\n-- rendered contract --");
    println!("{}", String::from_utf8_lossy(&document));

    Ok(())
}

fn demo_failure(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::other(err.to_string()))
}
