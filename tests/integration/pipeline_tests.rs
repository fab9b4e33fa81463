//! Integration tests for the mirror pipeline
//!
//! These tests use wiremock to stand in for the upstream API and image host
//! and drive the full five-stage run end-to-end, with zero delays.

use cocktail_mirror::config::Config;
use cocktail_mirror::crawler::Coordinator;
use cocktail_mirror::ledger::{ProgressLedger, WorkKind};
use cocktail_mirror::storage::{IngredientLine, SqliteStorage, Storage};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PREFIX: &str = "/api/json/v1/1";
const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

/// A cocktail fixture; an empty ingredient leaves its slot blank and an empty
/// measure is sent as null
struct DrinkFixture {
    id: &'static str,
    name: &'static str,
    slots: &'static [(&'static str, &'static str)],
}

const MOJITO: DrinkFixture = DrinkFixture {
    id: "11000",
    name: "Mojito",
    slots: &[
        ("Light rum", "2-3 oz "),
        ("Lime", "Juice of 1"),
        ("", ""),
        ("Mint", ""),
    ],
};

const MARGARITA: DrinkFixture = DrinkFixture {
    id: "11007",
    name: "Margarita",
    slots: &[
        ("Tequila", "1 1/2 oz"),
        ("Triple sec", "1/2 oz"),
        ("Lime juice", "1 oz"),
        ("Salt", ""),
    ],
};

const A1: DrinkFixture = DrinkFixture {
    id: "17222",
    name: "A1",
    slots: &[("Gin", "1 3/4 shot"), ("Grand Marnier", "1 Shot")],
};

const INGREDIENTS: [(&str, &str); 3] = [("Gin", "2"), ("Light rum", "3"), ("Tequila", "4")];

fn api_path(endpoint: &str) -> String {
    format!("{}/{}", API_PREFIX, endpoint)
}

fn drink_json(server: &MockServer, fixture: &DrinkFixture) -> Value {
    let mut drink = Map::new();
    drink.insert("idDrink".into(), json!(fixture.id));
    drink.insert("strDrink".into(), json!(fixture.name));
    drink.insert("strCategory".into(), json!("Cocktail"));
    drink.insert("strAlcoholic".into(), json!("Alcoholic"));
    drink.insert("strGlass".into(), json!("Cocktail glass"));
    drink.insert("strInstructions".into(), json!("Shake and strain."));
    drink.insert(
        "strDrinkThumb".into(),
        json!(format!(
            "{}/images/media/drink/{}.jpg",
            server.uri(),
            fixture.id
        )),
    );

    for slot in 1..=15 {
        let (ingredient, measure) = fixture.slots.get(slot - 1).copied().unwrap_or(("", ""));
        let ingredient = if ingredient.is_empty() && slot > fixture.slots.len() {
            Value::Null
        } else {
            json!(ingredient)
        };
        let measure = if measure.is_empty() {
            Value::Null
        } else {
            json!(measure)
        };
        drink.insert(format!("strIngredient{}", slot), ingredient);
        drink.insert(format!("strMeasure{}", slot), measure);
    }

    Value::Object(drink)
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.api_base_url = format!("{}{}", server.uri(), API_PREFIX);
    config.source.ingredient_image_base_url = format!("{}/images/ingredients", server.uri());
    config.rate_limit.request_delay_ms = 0;
    config.rate_limit.image_delay_ms = 0;
    config.user_agent.crawler_name = "TestMirror".to_string();
    config.output.data_dir = dir.path().join("data");
    config
}

async fn mount_search(server: &MockServer, letter: &str, ids: &[&str]) {
    let drinks: Vec<Value> = ids.iter().map(|id| json!({"idDrink": id})).collect();
    Mock::given(method("GET"))
        .and(path(api_path("search.php")))
        .and(query_param("f", letter))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drinks": drinks})))
        .mount(server)
        .await;
}

async fn mount_lookup(server: &MockServer, fixture: &DrinkFixture) {
    Mock::given(method("GET"))
        .and(path(api_path("lookup.php")))
        .and(query_param("i", fixture.id))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"drinks": [drink_json(server, fixture)]})),
        )
        .mount(server)
        .await;
}

/// Mounts the whole upstream: searches, lookups, ingredients and images
///
/// Mocks mounted before this call take precedence.
async fn mount_catalogue(server: &MockServer) {
    // 11007 is listed under two letters
    mount_search(server, "a", &[A1.id, MARGARITA.id]).await;
    mount_search(server, "m", &[MOJITO.id, MARGARITA.id]).await;

    for fixture in [&MOJITO, &MARGARITA, &A1] {
        mount_lookup(server, fixture).await;
    }

    let listing: Vec<Value> = INGREDIENTS
        .iter()
        .map(|(name, _)| json!({"strIngredient1": name}))
        .collect();
    Mock::given(method("GET"))
        .and(path(api_path("list.php")))
        .and(query_param("i", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drinks": listing})))
        .mount(server)
        .await;

    for (name, id) in INGREDIENTS {
        Mock::given(method("GET"))
            .and(path(api_path("search.php")))
            .and(query_param("i", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ingredients": [{
                    "idIngredient": id,
                    "strIngredient": name,
                    "strDescription": format!("{} is a spirit.", name),
                    "strType": "Spirit",
                    "strAlcohol": "Yes",
                    "strABV": "40"
                }]
            })))
            .mount(server)
            .await;
    }

    // Every other letter has no cocktails
    Mock::given(method("GET"))
        .and(path(api_path("search.php")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drinks": null})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/images/media/drink/\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_BYTES.to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/images/ingredients/.+-Medium\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES.to_vec()))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, suffix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().ends_with(suffix))
        .count()
}

fn line(position: u32, ingredient: &str, measure: Option<&str>) -> IngredientLine {
    IngredientLine {
        position,
        ingredient: ingredient.to_string(),
        measure: measure.map(str::to_string),
    }
}

#[tokio::test]
async fn test_full_run_mirrors_catalogue() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.cocktail_ids, 3);
    assert_eq!(summary.ingredient_names, 3);
    assert_eq!(summary.cocktails.completed, 3);
    assert_eq!(summary.ingredients.completed, 3);
    assert_eq!(summary.cocktail_images.completed, 3);
    assert_eq!(summary.ingredient_images.completed, 3);
    assert_eq!(summary.cocktails.failed, 0);
    assert_eq!(summary.snapshot.cocktails, 3);
    assert_eq!(summary.snapshot.ingredients, 3);

    // 36 prefix searches, one listing; a cocktail under two letters is looked up once
    let searches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("search.php"))
        .filter(|r| r.url.query_pairs().any(|(key, _)| key == "f"))
        .count();
    assert_eq!(searches, 36);
    assert_eq!(requests_to(&server, "list.php").await, 1);
    assert_eq!(requests_to(&server, "lookup.php").await, 3);

    let storage = coordinator.storage();
    assert_eq!(storage.count_cocktails().unwrap(), 3);
    assert_eq!(storage.count_ingredients().unwrap(), 3);

    // Blank slot 3 is skipped, slot numbers are kept
    assert_eq!(
        storage.get_ingredient_lines(MOJITO.id).unwrap(),
        vec![
            line(1, "Light rum", Some("2-3 oz")),
            line(2, "Lime", Some("Juice of 1")),
            line(4, "Mint", None),
        ]
    );

    let cocktail_image = config.output.cocktail_images_dir().join("11000.jpg");
    assert_eq!(std::fs::read(&cocktail_image).unwrap(), JPEG_BYTES);
    let mojito = storage.get_cocktail(MOJITO.id).unwrap().unwrap();
    assert_eq!(
        mojito.image_local_path,
        Some(cocktail_image.to_string_lossy().into_owned())
    );

    let ingredient_image = config.output.ingredient_images_dir().join("Light_rum.png");
    assert_eq!(std::fs::read(&ingredient_image).unwrap(), PNG_BYTES);
    let rum = storage.get_ingredient("Light rum").unwrap().unwrap();
    assert_eq!(rum.source_id.as_deref(), Some("3"));
    assert!(rum.image_local_path.is_some());

    let ledger = ProgressLedger::load(&config.output.progress_path()).unwrap();
    for kind in WorkKind::ALL {
        assert_eq!(ledger.count(kind), 3, "{}", kind);
    }
}

#[tokio::test]
async fn test_snapshot_matches_store() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    coordinator.run().await.unwrap();

    let exported: Value = serde_json::from_str(
        &std::fs::read_to_string(config.output.cocktails_export_path()).unwrap(),
    )
    .unwrap();
    let exported = exported.as_array().unwrap();
    assert_eq!(exported.len(), 3);

    for document in exported {
        let id = document["id"].as_str().unwrap();
        let expected: Vec<Value> = coordinator
            .storage()
            .get_ingredient_lines(id)
            .unwrap()
            .iter()
            .map(|line| {
                json!({
                    "ingredient": line.ingredient,
                    "measure": line.measure.clone().unwrap_or_default()
                })
            })
            .collect();
        assert_eq!(document["ingredients"], Value::Array(expected), "{}", id);
    }

    let margarita = exported.iter().find(|d| d["id"] == MARGARITA.id).unwrap();
    assert_eq!(margarita["name"], "Margarita");
    assert_eq!(margarita["ingredients"][3]["ingredient"], "Salt");
    assert_eq!(margarita["ingredients"][3]["measure"], "");

    let ingredients: Value = serde_json::from_str(
        &std::fs::read_to_string(config.output.ingredients_export_path()).unwrap(),
    )
    .unwrap();
    let names: Vec<&str> = ingredients
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Gin", "Light rum", "Tequila"]);
}

#[tokio::test]
async fn test_second_run_resumes_without_refetching() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut first = Coordinator::new(config.clone(), false).unwrap();
    first.run().await.unwrap();
    drop(first);
    let after_first = server.received_requests().await.unwrap().len();

    let mut second = Coordinator::new(config.clone(), false).unwrap();
    let summary = second.run().await.unwrap();

    assert_eq!(summary.cocktails.pending, 0);
    assert_eq!(summary.ingredients.pending, 0);
    assert_eq!(summary.cocktail_images.pending, 0);
    assert_eq!(summary.ingredient_images.pending, 0);

    // Only discovery is repeated
    let after_second = server.received_requests().await.unwrap().len();
    assert_eq!(after_second - after_first, 36 + 1);
    assert_eq!(second.storage().count_cocktails().unwrap(), 3);
}

#[tokio::test]
async fn test_recorded_units_are_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("lookup.php")))
        .and(query_param("i", MOJITO.id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drinks": null})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("search.php")))
        .and(query_param("i", "Gin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ingredients": null})))
        .expect(0)
        .mount(&server)
        .await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut ledger = ProgressLedger::new(&config.output.progress_path());
    ledger.record(WorkKind::Cocktail, MOJITO.id).unwrap();
    ledger.record(WorkKind::Ingredient, "Gin").unwrap();

    let mut coordinator = Coordinator::new(config, false).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.cocktails.pending, 2);
    assert_eq!(summary.cocktails.completed, 2);
    assert_eq!(summary.ingredients.pending, 2);

    // The skipped cocktail has no stored row, so its image has no URL yet
    assert_eq!(summary.cocktail_images.completed, 2);
    assert_eq!(summary.cocktail_images.failed, 1);
    assert!(!coordinator
        .ledger()
        .is_done(WorkKind::CocktailImage, MOJITO.id));

    // Gin's image is fetched from the derived URL but has no row to link to
    assert_eq!(summary.ingredient_images.completed, 2);
    assert_eq!(summary.ingredient_images.failed, 1);
    assert!(!coordinator
        .ledger()
        .is_done(WorkKind::IngredientImage, "Gin"));

    server.verify().await;
}

#[tokio::test]
async fn test_failed_lookup_is_retried_next_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("lookup.php")))
        .and(query_param("i", A1.id))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut first = Coordinator::new(config.clone(), false).unwrap();
    let summary = first.run().await.unwrap();
    assert_eq!(summary.cocktails.completed, 2);
    assert_eq!(summary.cocktails.failed, 1);
    assert!(!first.ledger().is_done(WorkKind::Cocktail, A1.id));
    assert!(first.storage().get_cocktail(A1.id).unwrap().is_none());
    drop(first);

    let mut second = Coordinator::new(config, false).unwrap();
    let summary = second.run().await.unwrap();
    assert_eq!(summary.cocktails.pending, 1);
    assert_eq!(summary.cocktails.completed, 1);
    assert_eq!(summary.cocktail_images.completed, 1);
    assert!(second.ledger().is_done(WorkKind::Cocktail, A1.id));
    assert!(second.ledger().is_done(WorkKind::CocktailImage, A1.id));
}

#[tokio::test]
async fn test_ingredient_image_waits_for_its_row() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("search.php")))
        .and(query_param("i", "Gin"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);
    let gin_image = config.output.ingredient_images_dir().join("Gin.png");

    let mut first = Coordinator::new(config.clone(), false).unwrap();
    let summary = first.run().await.unwrap();
    assert_eq!(summary.ingredients.completed, 2);
    assert_eq!(summary.ingredients.failed, 1);
    assert_eq!(summary.ingredient_images.completed, 2);
    assert_eq!(summary.ingredient_images.failed, 1);
    assert!(gin_image.exists());
    assert!(!first.ledger().is_done(WorkKind::IngredientImage, "Gin"));
    drop(first);
    let png_requests = requests_to(&server, ".png").await;

    let mut second = Coordinator::new(config, false).unwrap();
    let summary = second.run().await.unwrap();
    assert_eq!(summary.ingredients.completed, 1);
    assert_eq!(summary.ingredient_images.pending, 1);
    assert_eq!(summary.ingredient_images.completed, 1);
    assert!(second.ledger().is_done(WorkKind::IngredientImage, "Gin"));

    let gin = second.storage().get_ingredient("Gin").unwrap().unwrap();
    assert_eq!(
        gin.image_local_path,
        Some(gin_image.to_string_lossy().into_owned())
    );
    assert_eq!(second.storage().count_ingredient_images().unwrap(), 3);

    // The file from the first run is reused
    assert_eq!(requests_to(&server, ".png").await, png_requests);
}

#[tokio::test]
async fn test_existing_image_is_not_downloaded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/images/media/drink/{}.jpg", MOJITO.id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_BYTES.to_vec()))
        .expect(0)
        .mount(&server)
        .await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let cached = config.output.cocktail_images_dir().join("11000.jpg");
    std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
    std::fs::write(&cached, b"cached").unwrap();

    let mut coordinator = Coordinator::new(config, false).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.cocktail_images.completed, 3);
    assert_eq!(std::fs::read(&cached).unwrap(), b"cached".to_vec());
    assert!(coordinator
        .ledger()
        .is_done(WorkKind::CocktailImage, MOJITO.id));
    assert_eq!(
        coordinator
            .storage()
            .get_cocktail(MOJITO.id)
            .unwrap()
            .unwrap()
            .image_local_path,
        Some(cached.to_string_lossy().into_owned())
    );

    server.verify().await;
}

#[tokio::test]
async fn test_lost_ledger_redownload_is_idempotent() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut first = Coordinator::new(config.clone(), false).unwrap();
    first.run().await.unwrap();
    drop(first);

    // Store ahead of the ledger: everything is downloaded and upserted again
    std::fs::remove_file(config.output.progress_path()).unwrap();

    let mut second = Coordinator::new(config.clone(), false).unwrap();
    let summary = second.run().await.unwrap();
    assert_eq!(summary.cocktails.completed, 3);
    assert_eq!(summary.ingredients.completed, 3);

    let storage = second.storage();
    assert_eq!(storage.count_cocktails().unwrap(), 3);
    assert_eq!(storage.count_ingredients().unwrap(), 3);
    assert_eq!(storage.count_ingredient_lines().unwrap(), 3 + 4 + 2);
    assert_eq!(storage.count_cocktail_images().unwrap(), 3);
    assert_eq!(
        storage.get_ingredient_lines(MARGARITA.id).unwrap().len(),
        4
    );

    // Images already on disk are not fetched again
    assert_eq!(requests_to(&server, ".jpg").await, 3);
    assert_eq!(requests_to(&server, ".png").await, 3);
}

#[tokio::test]
async fn test_changed_recipe_replaces_lines() {
    let dir = TempDir::new().unwrap();

    let first_server = MockServer::start().await;
    mount_catalogue(&first_server).await;
    let mut first = Coordinator::new(test_config(&first_server, &dir), false).unwrap();
    first.run().await.unwrap();
    drop(first);

    const MOJITO_V2: DrinkFixture = DrinkFixture {
        id: "11000",
        name: "Mojito",
        slots: &[("White rum", "2 oz"), ("Soda water", "")],
    };

    let second_server = MockServer::start().await;
    mount_lookup(&second_server, &MOJITO_V2).await;
    mount_catalogue(&second_server).await;

    let config = test_config(&second_server, &dir);
    let mut second = Coordinator::new(config.clone(), true).unwrap();
    second.run().await.unwrap();

    let storage = second.storage();
    assert_eq!(storage.count_cocktails().unwrap(), 3);
    assert_eq!(
        storage.get_ingredient_lines(MOJITO.id).unwrap(),
        vec![line(1, "White rum", Some("2 oz")), line(2, "Soda water", None)]
    );

    // The fresh run finds the images on disk and keeps the local path
    let mojito = storage.get_cocktail(MOJITO.id).unwrap().unwrap();
    assert!(mojito.image_local_path.is_some());
    assert_eq!(requests_to(&second_server, ".jpg").await, 0);
}

#[tokio::test]
async fn test_ledger_on_disk_after_run() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    coordinator.bind_config_hash(Some("abc123"));
    coordinator.run().await.unwrap();

    let progress_path = config.output.progress_path();
    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(&progress_path).unwrap()).unwrap();
    assert_eq!(document["schema_version"], 1);
    assert_eq!(
        document["cocktails_downloaded"],
        json!(["11000", "11007", "17222"])
    );
    assert_eq!(
        document["ingredient_images_downloaded"],
        json!(["Gin", "Light rum", "Tequila"])
    );
    assert_eq!(document["config_hash"], "abc123");
    assert!(document["started_at"].is_string());
    assert!(document["last_updated"].is_string());

    let mut tmp = progress_path.into_os_string();
    tmp.push(".tmp");
    assert!(!std::path::Path::new(&tmp).exists());
}

#[tokio::test]
async fn test_open_store_reads_mirror() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    coordinator.run().await.unwrap();
    drop(coordinator);

    let storage = SqliteStorage::new(&config.output.database_path()).unwrap();
    let found = storage.search_cocktails_by_name("marg", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, MARGARITA.id);

    let with_gin = storage.find_cocktails_by_ingredient("gin", 10).unwrap();
    assert_eq!(with_gin.len(), 1);
    assert_eq!(with_gin[0].name, "A1");

    assert!(storage.random_cocktail().unwrap().is_some());
}
