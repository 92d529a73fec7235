use std::path::Path;

use chrono::offset::Utc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rocket::local::blocking::{Client, LocalResponse};

use quill::cache::ListingCache;
use quill::models::{Database, NewPost, NewUser};
use quill::{instance, Config};

fn get_page<'c>(client: &'c Client, uri: &'static str) -> LocalResponse<'c> {
    client.get(uri).dispatch()
}

fn seeded_site() -> (Client, tempfile::TempDir) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let upload_dir = tempfile::tempdir().expect("create upload dir");

    let config = Config {
        address: "127.0.0.1".into(),
        port: 8000,
        static_dir: root.join("static"),
        upload_dir: upload_dir.path().to_owned(),
        template_dir: root.join("templates"),
        database_url: ":memory:".into(),
        log_file: None,
        feed_cache_ttl: std::time::Duration::from_secs(20),
    };

    let db = Database::open(&config.database_url).expect("open database");
    let cache = ListingCache::new(config.feed_cache_ttl);

    let salt = [0u8; 16];
    let password_hash =
        argon2::hash_encoded(b"password1", &salt, &argon2::Config::default())
            .expect("hash password");

    let author = db
        .insert_user(NewUser {
            username: "ada".into(),
            display_name: "Ada".into(),
            password_hash,
            joined: Utc::now(),
        })
        .expect("insert user");

    for n in 0..30 {
        db.insert_post(NewPost {
            time_stamp: Utc::now(),
            body: format!("Post number {}", n),
            author: author.id,
            group_id: None,
            image: None,
        })
        .expect("insert post");
    }

    let rocket = instance(config, db, cache).expect("valid config");
    let client = Client::untracked(rocket).expect("valid rocket instance");

    (client, upload_dir)
}

pub fn bench_home(c: &mut Criterion) {
    let (client, _upload_dir) = seeded_site();

    // The first hit fills the listing cache, the loop measures cached serves.
    get_page(&client, "/");

    c.bench_function("home", |b| b.iter(|| get_page(black_box(&client), "/")));
}

pub fn bench_profile(c: &mut Criterion) {
    let (client, _upload_dir) = seeded_site();

    c.bench_function("profile", |b| {
        b.iter(|| get_page(black_box(&client), "/ada"))
    });
}

criterion_group!(benches, bench_home, bench_profile);
criterion_main!(benches);
