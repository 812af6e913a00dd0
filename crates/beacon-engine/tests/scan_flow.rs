//! End-to-end scan flows against an in-memory store.
//!
//! These tests walk the full pipeline the way the shop uses it: scan a
//! code, resolve it, dispatch the chosen action, and check what the store
//! says afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Utc};

use beacon_core::code::normalize;
use beacon_core::money::Money;
use beacon_db::{Database, DbConfig};
use beacon_engine::dispatch::{Action, DispatchSummary, NewProduct, TransactionDispatcher};
use beacon_engine::resolver::{ScanOutcome, ScanResolver};
use beacon_engine::session::{CycleOutcome, ScanSession};
use beacon_engine::ErrorCode;
use beacon_scan::capture::{CameraChannel, CameraConfig, StillImage, WedgeBuffer};
use beacon_scan::render::{render_label, LabelOptions};
use beacon_scan::DecoderAdapter;

async fn store() -> Database {
    Database::connect(DbConfig::in_memory()).await.unwrap()
}

fn lash_kit(barcode: Option<&str>) -> NewProduct {
    NewProduct {
        name: "Lash Kit".to_string(),
        category: "Lash".to_string(),
        cost: Money::from_cents(15000),
        initial_stock: 10,
        barcode: barcode.map(str::to_string),
    }
}

/// Scenario: empty store, scan of an unknown code, then creation with the
/// generator assigning both codes.
#[tokio::test]
async fn unknown_code_then_create_with_generated_codes() {
    let db = store().await;
    let resolver = ScanResolver::new(db.clone());
    let dispatcher = TransactionDispatcher::new(db.clone());

    // Scan lands nowhere: the store is empty.
    match resolver.resolve_raw("000123456789").await.unwrap() {
        ScanOutcome::Unknown(code) => assert_eq!(code.as_str(), "000123456789"),
        other => panic!("expected Unknown, got {:?}", other),
    }

    // Operator takes the "create this product" offer, no barcode supplied.
    let summary = dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap();

    let (product, codes) = match summary {
        DispatchSummary::ProductCreated { product, codes } => (product, codes),
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    // SKU is CAT-NAMESLUG-MMDD for today.
    let today = Utc::now();
    let expected_sku = format!("LAS-LASHKIT-{:02}{:02}", today.month(), today.day());
    assert_eq!(product.sku, expected_sku);
    assert_eq!(codes.category_token, "LAS");
    assert_eq!(codes.name_token, "LASHKIT");

    // Barcode is a generated, unique 12-digit number.
    assert_eq!(codes.barcode.len(), 12);
    assert!(codes.barcode.is_numeric());
    assert!(codes.barcode_seed.is_some());

    // Both codes resolve back to the product.
    match resolver.resolve(&codes.barcode).await.unwrap() {
        ScanOutcome::Found(found) => assert_eq!(found.id, product.id),
        other => panic!("expected Found by barcode, got {:?}", other),
    }
    match resolver.resolve_raw(&expected_sku).await.unwrap() {
        ScanOutcome::Found(found) => assert_eq!(found.id, product.id),
        other => panic!("expected Found by SKU, got {:?}", other),
    }
}

/// Creating from an unknown scanned code adopts that code as the barcode.
#[tokio::test]
async fn create_adopting_the_scanned_code() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());

    let summary = dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(Some("000123456789")),
        })
        .await
        .unwrap();

    match summary {
        DispatchSummary::ProductCreated { product, codes } => {
            assert_eq!(product.barcode, "000123456789");
            assert!(codes.barcode_seed.is_none());
        }
        other => panic!("expected ProductCreated, got {:?}", other),
    }
}

/// Scenario: stock 10, StockOut(3) succeeds to 7; StockOut(20) fails with
/// InsufficientStock and stock stays 7.
#[tokio::test]
async fn stock_out_respects_available_stock() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());

    let product_id = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => product.id,
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    match dispatcher
        .apply(Action::StockOut {
            product_id: product_id.clone(),
            quantity: 3,
        })
        .await
        .unwrap()
    {
        DispatchSummary::StockChanged { new_stock, .. } => assert_eq!(new_stock, 7),
        other => panic!("expected StockChanged, got {:?}", other),
    }

    let err = dispatcher
        .apply(Action::StockOut {
            product_id: product_id.clone(),
            quantity: 20,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert!(err.user_message().contains("Only 7 in stock"));

    let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
    assert_eq!(product.current_stock, 7);
}

/// Sale atomicity: success decrements stock and appends exactly one ledger
/// row; failure leaves both untouched.
#[tokio::test]
async fn sale_is_atomic_with_the_ledger() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());

    let product_id = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => product.id,
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    // Sell 2 at 250.00 against the 150.00 cost basis.
    match dispatcher
        .apply(Action::Sale {
            product_id: product_id.clone(),
            quantity: 2,
            unit_price: Money::from_cents(25000),
        })
        .await
        .unwrap()
    {
        DispatchSummary::SaleRecorded { record, new_stock } => {
            assert_eq!(new_stock, 8);
            assert_eq!(record.revenue_cents, 50000);
            assert_eq!(record.profit_cents, 20000);
        }
        other => panic!("expected SaleRecorded, got {:?}", other),
    }

    let ledger = db.sales().list_for_product(&product_id).await.unwrap();
    assert_eq!(ledger.len(), 1);

    // Oversell: typed failure, stock and ledger unchanged.
    let err = dispatcher
        .apply(Action::Sale {
            product_id: product_id.clone(),
            quantity: 50,
            unit_price: Money::from_cents(25000),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
    assert_eq!(product.current_stock, 8);
    assert_eq!(db.sales().list_for_product(&product_id).await.unwrap().len(), 1);
}

/// Scenario: empty raw input resolves to Malformed without a store query.
#[tokio::test]
async fn empty_input_is_malformed() {
    let db = store().await;
    let resolver = ScanResolver::new(db);

    match resolver.resolve_raw("").await.unwrap() {
        ScanOutcome::Malformed { reason, .. } => assert!(reason.contains("empty")),
        other => panic!("expected Malformed, got {:?}", other),
    }
}

/// Duplicate codes are rejected at creation with a DuplicateCode outcome.
#[tokio::test]
async fn duplicate_barcode_rejected_on_create() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());

    dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(Some("000123456789")),
        })
        .await
        .unwrap();

    let mut second = lash_kit(Some("000123456789"));
    second.name = "Different Kit".to_string();
    let err = dispatcher
        .apply(Action::CreateProduct { attrs: second })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::DuplicateCode);
}

/// Code regeneration re-derives the SKU and draws a fresh barcode, and the
/// new codes resolve.
#[tokio::test]
async fn regenerate_codes_rotates_the_barcode() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());
    let resolver = ScanResolver::new(db.clone());

    let (product_id, old_barcode) = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => {
            (product.id, product.barcode)
        }
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    let codes = match dispatcher
        .apply(Action::RegenerateCode {
            product_id: product_id.clone(),
        })
        .await
        .unwrap()
    {
        DispatchSummary::CodeRegenerated { codes, .. } => codes,
        other => panic!("expected CodeRegenerated, got {:?}", other),
    };

    assert_ne!(codes.barcode.as_str(), old_barcode);

    match resolver.resolve(&codes.barcode).await.unwrap() {
        ScanOutcome::Found(found) => assert_eq!(found.id, product_id),
        other => panic!("expected Found, got {:?}", other),
    }

    // The retired barcode no longer resolves.
    match resolver.resolve(&normalize(&old_barcode).unwrap()).await.unwrap() {
        ScanOutcome::Unknown(_) => {}
        other => panic!("expected Unknown for retired barcode, got {:?}", other),
    }
}

/// Full image pipeline: render the product's label, decode it through the
/// still-image channel, and resolve to the product.
#[tokio::test]
async fn printed_label_scans_back_to_the_product() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());
    let resolver = ScanResolver::new(db.clone());

    let product = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => product,
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    let frame = render_label(
        &normalize(&product.barcode).unwrap(),
        &LabelOptions::default(),
    )
    .unwrap();

    let adapter = DecoderAdapter::new();
    let still = StillImage::from_frame(&adapter, &frame);
    let mut session = ScanSession::new(still, resolver);

    match session.cycle().await.unwrap() {
        CycleOutcome::Resolved {
            event: Some(event),
            outcome: ScanOutcome::Found(found),
        } => {
            assert_eq!(found.id, product.id);
            assert_eq!(event.code.as_str(), product.barcode);
        }
        other => panic!("expected Found via image, got {:?}", other),
    }
}

/// Camera channel end to end: frames of a held label resolve once (the
/// debounce window collapses the repeats).
#[tokio::test(flavor = "multi_thread")]
async fn camera_session_resolves_held_label_once() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());
    let resolver = ScanResolver::new(db.clone());

    let product = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => product,
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    struct HeldLabel {
        frame: beacon_scan::Frame,
    }
    impl beacon_scan::FrameSource for HeldLabel {
        fn next_frame(&mut self) -> Result<beacon_scan::Frame, beacon_scan::CaptureError> {
            Ok(self.frame.clone())
        }
    }

    let frame = render_label(
        &normalize(&product.barcode).unwrap(),
        &LabelOptions::default(),
    )
    .unwrap();

    let adapter = Arc::new(DecoderAdapter::new());
    let camera = CameraChannel::start(
        HeldLabel { frame },
        adapter,
        CameraConfig {
            frame_interval: Duration::from_millis(5),
            debounce_window: Duration::from_secs(60),
        },
    )
    .unwrap();

    let mut session = ScanSession::new(camera, resolver);
    let mut resolutions = 0usize;
    let deadline = Instant::now() + Duration::from_millis(500);
    while Instant::now() < deadline {
        match session.cycle().await.unwrap() {
            CycleOutcome::Pending => tokio::time::sleep(Duration::from_millis(2)).await,
            CycleOutcome::Resolved {
                outcome: ScanOutcome::Found(found),
                ..
            } => {
                assert_eq!(found.id, product.id);
                resolutions += 1;
            }
            other => panic!("unexpected cycle outcome: {:?}", other),
        }
    }

    // Dozens of frames decoded, one physical presentation, one resolution.
    assert_eq!(resolutions, 1);

    let mut camera = session.into_source();
    camera.stop();
}

/// The wedge-scanner path drives the same resolution as the camera.
#[tokio::test]
async fn wedge_scanner_burst_resolves() {
    let db = store().await;
    let dispatcher = TransactionDispatcher::new(db.clone());
    let resolver = ScanResolver::new(db.clone());

    let product = match dispatcher
        .apply(Action::CreateProduct {
            attrs: lash_kit(None),
        })
        .await
        .unwrap()
    {
        DispatchSummary::ProductCreated { product, .. } => product,
        other => panic!("expected ProductCreated, got {:?}", other),
    };

    let mut wedge = WedgeBuffer::scanner();
    wedge.push_str(&format!("{}\r\n", product.barcode));

    let mut session = ScanSession::new(wedge, resolver);
    match session.cycle().await.unwrap() {
        CycleOutcome::Resolved {
            outcome: ScanOutcome::Found(found),
            ..
        } => assert_eq!(found.id, product.id),
        other => panic!("expected Found via wedge, got {:?}", other),
    }
}
