use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use recommender::HybridRecommender;
use social_store::{InteractionStore, MemoryStore, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// WanderRecs - Travel Social Recommendation Engine
#[derive(Parser)]
#[command(name = "wander-recs")]
#[command(about = "Hybrid post/account/destination recommendations over a social feed", long_about = None)]
struct Cli {
    /// Path to the JSON feed snapshot
    #[arg(short, long, default_value = "data/feed.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get post recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Suggest accounts to follow
    Accounts {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Suggest travel destinations
    Destinations {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show which ranking strategy a user would get, and why
    Explain {
        #[arg(long)]
        user_id: UserId,
    },

    /// Show a user's profile and engagement summary
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// Run a recommendation throughput benchmark
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading feed snapshot from {}...", cli.data.display());
    let start = Instant::now();
    let memory_store = MemoryStore::load_from_json(&cli.data)
        .with_context(|| format!("Failed to load feed from {}", cli.data.display()))?;
    let (users, posts, interactions) = memory_store.counts();
    println!(
        "{} Loaded {} users, {} posts, {} interactions in {:?}",
        "✓".green(),
        users,
        posts,
        interactions,
        start.elapsed()
    );

    let store: Arc<dyn InteractionStore> = Arc::new(memory_store);
    let recommender = HybridRecommender::new(store.clone());

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            json,
        } => handle_recommend(&recommender, user_id, limit, json).await?,
        Commands::Accounts { user_id, limit } => {
            handle_accounts(&recommender, user_id, limit).await?
        }
        Commands::Destinations { user_id, limit } => {
            handle_destinations(&recommender, user_id, limit).await?
        }
        Commands::Explain { user_id } => handle_explain(&recommender, user_id)?,
        Commands::User { user_id } => handle_user(store.as_ref(), user_id)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(recommender, store, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    recommender: &HybridRecommender,
    user_id: UserId,
    limit: usize,
    json: bool,
) -> Result<()> {
    let start = Instant::now();
    let recommendations = recommender.recommend_posts(user_id, limit).await?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    if recommendations.is_empty() {
        println!("{} No recommendations available yet", "!".yellow());
        return Ok(());
    }

    println!(
        "\n{} recommendations for user {} ({:?}):\n",
        recommendations.len(),
        user_id,
        elapsed
    );
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} {}",
            i + 1,
            format!("[post {}]", rec.post_id).cyan(),
            rec.caption
        );
        println!(
            "   location: {} | score: {:.3} | strategy: {}",
            rec.location.as_deref().unwrap_or("-"),
            rec.score,
            rec.strategy.to_string().magenta()
        );
        println!("   {}", rec.reason.dimmed());
    }
    Ok(())
}

/// Handle the 'accounts' command
async fn handle_accounts(
    recommender: &HybridRecommender,
    user_id: UserId,
    limit: usize,
) -> Result<()> {
    let accounts = recommender.recommend_accounts(user_id, limit).await?;

    if accounts.is_empty() {
        println!("{} No account suggestions yet", "!".yellow());
        return Ok(());
    }

    println!("\nAccounts user {} might follow:\n", user_id);
    for (i, account) in accounts.iter().enumerate() {
        println!(
            "{}. @{} ({} followers){}",
            i + 1,
            account.username.cyan(),
            account.follower_count,
            account
                .travel_style
                .as_deref()
                .map(|style| format!(" - {} traveler", style))
                .unwrap_or_default()
        );
        println!("   {}", account.reason.dimmed());
    }
    Ok(())
}

/// Handle the 'destinations' command
async fn handle_destinations(
    recommender: &HybridRecommender,
    user_id: UserId,
    limit: usize,
) -> Result<()> {
    let destinations = recommender.recommend_destinations(user_id, limit).await?;

    if destinations.is_empty() {
        println!("{} No destination suggestions yet", "!".yellow());
        return Ok(());
    }

    println!("\nDestinations for user {}:\n", user_id);
    for (i, destination) in destinations.iter().enumerate() {
        println!(
            "{}. {}, {} ({}) - score {:.3}",
            i + 1,
            destination.location.name.cyan(),
            destination.location.country,
            destination.location.category,
            destination.score
        );
        if !destination.reasons.is_empty() {
            println!("   {}", destination.reasons.join("; ").dimmed());
        }
    }
    Ok(())
}

/// Handle the 'explain' command
fn handle_explain(recommender: &HybridRecommender, user_id: UserId) -> Result<()> {
    let report = recommender.explain_strategy(user_id)?;

    println!("\nStrategy for user {}:", user_id);
    println!("  interactions: {}", report.interaction_count);
    println!(
        "  threshold:    {}",
        report.min_interactions_for_collaborative
    );
    println!("  strategy:     {}", report.strategy.to_string().magenta());
    println!("  {}", report.description);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(store: &dyn InteractionStore, user_id: UserId) -> Result<()> {
    let user = store
        .get_user(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    println!("\n@{} (user {})", user.username.cyan(), user.id);
    if !user.bio.is_empty() {
        println!("  {}", user.bio);
    }
    if let Some(style) = &user.travel_style {
        println!("  travel style: {}", style);
    }
    println!("  posts:        {}", store.get_posts_by_author(user_id).len());
    println!("  interactions: {}", store.get_interactions(user_id).len());
    println!("  following:    {}", store.get_following(user_id).len());
    println!("  followers:    {}", store.follower_count(user_id));
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: HybridRecommender,
    store: Arc<dyn InteractionStore>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids: Vec<UserId> = store.get_users().iter().map(|u| u.id).collect();
    if user_ids.is_empty() {
        return Err(anyhow!("No users in the feed, nothing to benchmark"));
    }

    println!(
        "Running {} requests ({} concurrent) over {} users...",
        requests,
        concurrent,
        user_ids.len()
    );

    // Warm the model cache so the numbers measure request latency, not the
    // cold-start build
    let warmup = user_ids[rand::random_range(0..user_ids.len())];
    recommender.recommend_posts(warmup, 10).await?;

    let start = Instant::now();
    let mut remaining = requests;
    let mut completed = 0usize;
    let mut failed = 0usize;

    while remaining > 0 {
        let batch = remaining.min(concurrent);
        let mut join_set = tokio::task::JoinSet::new();

        for _ in 0..batch {
            let user_id = user_ids[rand::random_range(0..user_ids.len())];
            let recommender = recommender.clone();
            join_set.spawn(async move { recommender.recommend_posts(user_id, 10).await });
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(_)) => completed += 1,
                _ => failed += 1,
            }
        }
        remaining -= batch;
    }

    let elapsed = start.elapsed();
    let per_request = elapsed / requests.max(1) as u32;
    println!(
        "{} {} requests in {:?} ({:?}/request, {} failed)",
        "✓".green(),
        completed,
        elapsed,
        per_request,
        failed
    );
    Ok(())
}
