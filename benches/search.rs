//! Performance benchmarks for ranked post search

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use clubhub::search::{
    similarity, FuzzyCapability, ProbeOutcome, RankedSearch, SearchConfig, TrigramSet,
};
use clubhub::storage::queries::*;
use clubhub::storage::Storage;
use clubhub::types::*;

fn setup_storage_with_posts(count: usize) -> Storage {
    let storage = Storage::open_in_memory().unwrap();

    let sample_titles = [
        "Chess Club weekly meetup",
        "Art Jam: open painting session",
        "Robotics team recruitment",
        "Spring tournament registration",
        "Debate society finals",
        "Photography walk around campus",
        "Шахматный клуб: блиц-турнир",
        "Volunteer sign-up for charity run",
        "Jazz ensemble rehearsal schedule",
        "Hackathon kickoff and team formation",
    ];

    storage
        .with_transaction(|conn| {
            let club = create_club(
                conn,
                &CreateClubInput {
                    name: "Bench Club".to_string(),
                    description: String::new(),
                    avatar_url: String::new(),
                },
            )?;
            for i in 0..count {
                let input = CreatePostInput {
                    club_id: club.id,
                    title: format!("{} #{}", sample_titles[i % sample_titles.len()], i),
                    content: format!(
                        "Details for post {} with schedule, location and a sign-up link",
                        i
                    ),
                    image_url: String::new(),
                    post_type: if i % 3 == 0 {
                        PostType::Event
                    } else {
                        PostType::Post
                    },
                    is_form: i % 7 == 0,
                    published_at: None,
                };
                create_post(conn, &input)?;
            }
            Ok(())
        })
        .unwrap();

    storage
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    group.bench_function("str_pair", |b| {
        b.iter(|| similarity(black_box("tournamnet"), black_box("Spring tournament registration")))
    });

    let token = TrigramSet::new("tournamnet");
    let word = TrigramSet::new("tournament");
    group.bench_function("precomputed_sets", |b| {
        b.iter(|| black_box(&token).similarity(black_box(&word)))
    });

    group.finish();
}

fn bench_ranked_search(c: &mut Criterion) {
    let storage = setup_storage_with_posts(1000);
    let config = SearchConfig::default();
    let database = FuzzyCapability::with_outcome(ProbeOutcome::Available);
    let in_process = FuzzyCapability::with_outcome(ProbeOutcome::Unavailable);

    let mut group = c.benchmark_group("ranked_search");
    group.throughput(Throughput::Elements(1000));

    let queries = ["chess", "tournamnet", "painting session", "шахматы"];

    for query in queries {
        group.bench_with_input(BenchmarkId::new("database", query), &query, |b, query| {
            b.iter(|| {
                RankedSearch::new(&storage, &database, &config)
                    .search(&PostFilter::default(), black_box(query), Some(20))
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("in_process", query), &query, |b, query| {
            b.iter(|| {
                RankedSearch::new(&storage, &in_process, &config)
                    .search(&PostFilter::default(), black_box(query), Some(20))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_unranked_listing(c: &mut Criterion) {
    let storage = setup_storage_with_posts(1000);
    let config = SearchConfig::default();
    let capability = FuzzyCapability::with_outcome(ProbeOutcome::Available);
    let events = PostFilter {
        event_like: true,
        ..Default::default()
    };

    c.bench_function("unranked_events", |b| {
        b.iter(|| {
            RankedSearch::new(&storage, &capability, &config)
                .search(black_box(&events), "", Some(50))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_similarity,
    bench_ranked_search,
    bench_unranked_listing
);
criterion_main!(benches);
