use std::error::Error;
use std::sync::Arc;

use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use futures::future::try_join_all;

use chirpy::db::{create_session, ensure_schema, ScyllaStore};
use chirpy::sanitize::clean_body;
use chirpy::store::{ChirpStore, StoreError};
use chirpy::validation::MAX_CHIRP_LEN;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    println!("Starting data seeding...");

    let nodes: Vec<String> = std::env::var("DB_URL")
        .unwrap_or_else(|_| "127.0.0.1:9042".to_string())
        .split(',')
        .map(|node| node.trim().to_string())
        .filter(|node| !node.is_empty())
        .collect();

    let session = create_session(&nodes).await?;
    ensure_schema(&session).await?;
    let store = ScyllaStore::new(Arc::new(session));

    // Configuration
    let num_users = 100;
    let chirps_per_user = 20;

    let users = seed_users(&store, num_users).await?;
    seed_chirps(&store, &users, chirps_per_user).await?;

    println!("Seeding completed!");
    Ok(())
}

async fn seed_users(store: &ScyllaStore, count: usize) -> Result<Vec<uuid::Uuid>, StoreError> {
    println!("Creating {} users...", count);
    let mut users = Vec::with_capacity(count);

    while users.len() < count {
        let email: String = SafeEmail().fake();
        match store.create_user(&email).await {
            Ok(user) => {
                users.push(user.id);
                println!("Created user {}/{}: {} ({})", users.len(), count, email, user.id);
            }
            Err(StoreError::DuplicateEmail(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(users)
}

async fn seed_chirps(
    store: &ScyllaStore,
    users: &[uuid::Uuid],
    chirps_per_user: usize,
) -> Result<(), StoreError> {
    println!("Creating {} chirps per user...", chirps_per_user);
    let total = users.len() * chirps_per_user;
    let mut created = 0;

    for &user_id in users {
        let bodies: Vec<String> = (0..chirps_per_user)
            .map(|_| {
                let sentence: String = Sentence(3..10).fake();
                clean_body(&sentence.chars().take(MAX_CHIRP_LEN).collect::<String>())
            })
            .collect();

        try_join_all(bodies.iter().map(|body| store.create_chirp(body, user_id))).await?;

        created += chirps_per_user;
        if created % 100 == 0 {
            println!("Created {}/{} chirps", created, total);
        }
    }

    Ok(())
}
