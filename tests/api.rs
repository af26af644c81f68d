//! Tests d'intégration HTTP contre une base SQLite en mémoire.

use actix_web::{App, test, web::Data};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use pointage::auth::jwt::generate_access_token;
use pointage::auth::password::hash_password;
use pointage::config::Config;
use pointage::migration::{MIGRATIONS, MigrationGate};
use pointage::model::role::Role;
use pointage::routes;

const JWT_SECRET: &str = "secret-de-test";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: JWT_SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 604_800,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
    }
}

/// Pool en mémoire: une seule connexion, sinon chaque connexion du pool
/// verrait une base différente.
async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("pool sqlite en mémoire");

    let mut gate = MigrationGate::new();
    gate.run(&pool, MIGRATIONS).await.expect("migrations");

    pool
}

async fn seed_user(pool: &SqlitePool, username: &str, password: &str, role: Role) -> i64 {
    let result = sqlx::query("INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hash_password(password))
        .bind(role.id() as i64)
        .execute(pool)
        .await
        .expect("insertion utilisateur");
    result.last_insert_rowid()
}

async fn seed_employe(pool: &SqlitePool, nom: &str, prenom: &str, salaire_base: f64) -> i64 {
    let result = sqlx::query(
        "INSERT INTO employes (nom, prenom, poste, salaire_base, statut) VALUES (?, ?, 'Maçon', ?, 'ACTIF')",
    )
    .bind(nom)
    .bind(prenom)
    .bind(salaire_base)
    .execute(pool)
    .await
    .expect("insertion employé");
    result.last_insert_rowid()
}

fn token(user_id: i64, username: &str, role: Role) -> String {
    generate_access_token(user_id, username.into(), role.id(), None, JWT_SECRET, 900)
}

macro_rules! app {
    ($pool:expr, $config:expr) => {{
        let config = $config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new($pool.clone()))
                .app_data(Data::new($config.clone()))
                .configure(move |cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

fn get(uri: &str, token: &str) -> actix_web::test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {token}")))
}

fn post_json(uri: &str, token: &str, body: Value) -> actix_web::test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(body)
}

async fn nb_pointages(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM pointages")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn login_puis_identifiants_invalides() {
    let pool = setup_pool().await;
    let config = test_config();
    seed_user(&pool, "chef1", "motdepasse", Role::Chef).await;
    let app = app!(pool, config);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "chef1", "password": "motdepasse"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "chef1", "password": "mauvais"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn pointage_sans_employe_rejete_sans_ecriture() {
    let pool = setup_pool().await;
    let config = test_config();
    seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let app = app!(pool, config);

    let req = post_json(
        "/api/pointage",
        &chef,
        json!({"date": "2026-01-05", "statut": "PRESENT"}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Champ requis"), "message: {message}");
    assert!(!message.contains("succès"));

    assert_eq!(nb_pointages(&pool).await, 0);
}

#[actix_web::test]
async fn admin_refuse_sur_la_saisie_de_pointage() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let admin = token(1, "admin", Role::Admin);
    let app = app!(pool, config);

    let req = post_json(
        "/api/pointage",
        &admin,
        json!({"employe_id": employe_id, "date": "2026-01-05", "statut": "PRESENT"}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Accès refusé"));

    // refus sans mutation
    assert_eq!(nb_pointages(&pool).await, 0);
}

#[actix_web::test]
async fn pointage_enregistre_relu_et_idempotent() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let app = app!(pool, config);

    let corps = json!({
        "employe_id": employe_id,
        "date": "2026-01-05",
        "statut": "PRESENT",
        "avance": 50.0
    });

    let resp = test::call_service(&app, post_json("/api/pointage", &chef, corps.clone()).to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Présence enregistrée avec succès");
    assert_eq!(body["pointage"]["statut"], "PRESENT");

    // relecture immédiate
    let uri = format!("/api/pointages?employe_id={employe_id}&mois=1&annee=2026");
    let resp = test::call_service(&app, get(&uri, &chef).to_request()).await;
    assert_eq!(resp.status(), 200);
    let liste: Value = test::read_body_json(resp).await;
    assert_eq!(liste.as_array().unwrap().len(), 1);
    assert_eq!(liste[0]["statut"], "PRESENT");
    assert_eq!(liste[0]["avance"], 50.0);

    // renvoi identique: même état, même confirmation
    let resp = test::call_service(&app, post_json("/api/pointage", &chef, corps).to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Présence enregistrée avec succès");
    assert_eq!(nb_pointages(&pool).await, 1);
}

#[actix_web::test]
async fn correction_absent_vers_present_sur_date_passee() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let app = app!(pool, config);

    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2025-12-08", "statut": "ABSENT"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    // les dates passées restent modifiables, même chemin d'upsert
    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2025-12-08", "statut": "PRESENT"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Présence enregistrée avec succès");

    let uri = format!("/api/pointages?employe_id={employe_id}&mois=12&annee=2025");
    let resp = test::call_service(&app, get(&uri, &chef).to_request()).await;
    let liste: Value = test::read_body_json(resp).await;
    assert_eq!(liste.as_array().unwrap().len(), 1);
    assert_eq!(liste[0]["statut"], "PRESENT");
    assert_eq!(liste[0]["jours_travailles"], 1.0);
}

#[actix_web::test]
async fn avance_negative_et_employe_inconnu_rejetes() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let app = app!(pool, config);

    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2026-01-05", "statut": "PRESENT", "avance": -10.0}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": 9999, "date": "2026-01-05", "statut": "PRESENT"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Employé non trouvé");

    assert_eq!(nb_pointages(&pool).await, 0);
}

#[actix_web::test]
async fn paie_avance_superieure_au_gain_plancher_et_dette() {
    let pool = setup_pool().await;
    let config = test_config();
    // salaire base 260 => taux journalier 10 TND
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 260.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let admin = token(2, "admin", Role::Admin);
    let app = app!(pool, config);

    // 1 jour présent (lundi 5 janvier 2026) avec avance de 500
    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2026-01-05", "statut": "PRESENT", "avance": 500.0}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let uri = format!("/api/paie/{employe_id}?mois=1&annee=2026");
    let resp = test::call_service(&app, get(&uri, &admin).to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;

    let salaire = &body["salaire"];
    assert_eq!(salaire["salaire_brut"], 10.0);
    assert_eq!(salaire["salaire_net"], 0.0);
    assert_eq!(salaire["salaire_net_affiche"], "0.000 TND");
    assert_eq!(salaire["dette_a_recouvrer"], 490.0);

    // jamais net et dette positifs ensemble
    assert!(
        !(salaire["salaire_net"].as_f64().unwrap() > 0.0
            && salaire["dette_a_recouvrer"].as_f64().unwrap() > 0.0)
    );

    // la paie est une page d'administration: chef refusé
    let resp = test::call_service(&app, get(&uri, &chef).to_request()).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn paie_avances_inferieures_au_gain() {
    let pool = setup_pool().await;
    let config = test_config();
    // taux journalier 100 TND
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 2600.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let admin = token(2, "admin", Role::Admin);
    let app = app!(pool, config);

    for (jour, avance) in [(5, 0.0), (6, 150.0), (7, 0.0)] {
        let resp = test::call_service(
            &app,
            post_json(
                "/api/pointage",
                &chef,
                json!({
                    "employe_id": employe_id,
                    "date": format!("2026-01-{jour:02}"),
                    "statut": "PRESENT",
                    "avance": avance
                }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);
    }

    let uri = format!("/api/paie/{employe_id}?mois=1&annee=2026");
    let resp = test::call_service(&app, get(&uri, &admin).to_request()).await;
    let body: Value = test::read_body_json(resp).await;

    let salaire = &body["salaire"];
    assert_eq!(salaire["salaire_brut"], 300.0);
    assert_eq!(salaire["salaire_net"], 150.0);
    assert_eq!(salaire["dette_a_recouvrer"], 0.0);
}

#[actix_web::test]
async fn rapport_contient_les_sections_nominatives() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 2600.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let admin = token(2, "admin", Role::Admin);
    let app = app!(pool, config);

    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2026-01-05", "statut": "PRESENT"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = test::call_service(
        &app,
        get("/api/rapports?mois=1&annee=2026", &admin).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let rapports: Value = test::read_body_json(resp).await;

    let rapport = &rapports.as_array().unwrap()[0];
    assert!(rapport.get("presence").is_some());
    assert!(rapport.get("heures_supp").is_some());
    assert!(rapport.get("salaire").is_some());
    assert_eq!(rapport["presence"]["jours_presence"], 1.0);
    assert_eq!(rapport["employe"]["nom"], "Trabelsi");

    // lecture seule et réservée à l'administrateur
    let resp = test::call_service(
        &app,
        get("/api/rapports?mois=1&annee=2026", &chef).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn presence_un_jour_ferie_reclassee() {
    let pool = setup_pool().await;
    let config = test_config();
    let employe_id = seed_employe(&pool, "Trabelsi", "Karim", 2600.0).await;
    let chef = token(1, "chef1", Role::Chef);
    let app = app!(pool, config);

    // 1er mai: fête du travail
    let resp = test::call_service(
        &app,
        post_json(
            "/api/pointage",
            &chef,
            json!({"employe_id": employe_id, "date": "2026-05-01", "statut": "PRESENT"}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pointage"]["statut"], "FERIE");
}

async fn nb_users(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn inscription_anonyme_ne_cree_pas_de_chef() {
    let pool = setup_pool().await;
    let config = test_config();
    let admin_id = seed_user(&pool, "admin", "motdepasse", Role::Admin).await;
    let app = app!(pool, config);

    // un visiteur non authentifié réclame le rôle chef: refusé, rien n'est créé
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "intrus", "password": "secret", "role_id": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Accès refusé"));
    assert_eq!(nb_users(&pool).await, 1);

    // le compte refusé ne peut pas se connecter
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "intrus", "password": "secret"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // un compte employé reste ouvert à tous
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "ouvrier1", "password": "secret", "role_id": 3}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    // l'administrateur connecté peut créer un chef
    let admin = token(admin_id, "admin", Role::Admin);
    let resp = test::call_service(
        &app,
        post_json(
            "/auth/register",
            &admin,
            json!({"username": "chef2", "password": "secret", "role_id": 2}),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    assert_eq!(nb_users(&pool).await, 3);
}

#[actix_web::test]
async fn premier_compte_admin_sur_base_vide() {
    let pool = setup_pool().await;
    let config = test_config();
    let app = app!(pool, config);

    // amorçage: la toute première inscription peut être l'administrateur
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "admin", "password": "motdepasse", "role_id": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    // la base n'est plus vide: plus d'auto-promotion possible
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .set_json(json!({"username": "admin2", "password": "motdepasse", "role_id": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    assert_eq!(nb_users(&pool).await, 1);
}

#[actix_web::test]
async fn limite_de_debit_appliquee_sur_login() {
    let pool = setup_pool().await;
    let mut config = test_config();
    config.rate_login_per_min = 2;
    seed_user(&pool, "chef1", "motdepasse", Role::Chef).await;
    let app = app!(pool, config);

    let mut statuts = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .set_json(json!({"username": "chef1", "password": "motdepasse"}))
            .to_request();
        statuts.push(test::call_service(&app, req).await.status().as_u16());
    }
    assert_eq!(statuts[0], 200);
    assert_eq!(statuts[1], 200);
    assert_eq!(statuts[2], 429);
}

#[actix_web::test]
async fn pagination_page_extreme_renvoie_une_liste_vide() {
    let pool = setup_pool().await;
    let config = test_config();
    seed_employe(&pool, "Trabelsi", "Karim", 1300.0).await;
    let admin = token(1, "admin", Role::Admin);
    let app = app!(pool, config);

    let uri = format!("/api/employes?page={}&per_page=100", u32::MAX);
    let resp = test::call_service(&app, get(&uri, &admin).to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 1);
}

#[actix_web::test]
async fn acces_sans_jeton_refuse() {
    let pool = setup_pool().await;
    let config = test_config();
    let app = app!(pool, config);

    let req = test::TestRequest::get()
        .uri("/api/pointages")
        .peer_addr("127.0.0.1:40000".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
