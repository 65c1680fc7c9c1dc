use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use teamspace::content::{Project, ProjectList, ProjectTask, Vote};
use teamspace::facade::{projects, votes};
use teamspace::model::{OrderBy, OrderDirection};
use teamspace::{
    Backend, CreateEntityInput, EntityFilters, EntityId, EntityStatus, EntityStore, SpaceId,
    StoreConfig, TypedContent, UpdateEntityInput, UserId, bootstrap,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "teamspace")]
#[command(about = "Inspect and edit the teamspace entity store")]
struct Cli {
    /// `memory` or `postgres`; overrides TEAMSPACE_BACKEND.
    #[arg(long, global = true)]
    backend: Option<String>,
    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create tables and provision the built-in schemas.
    Migrate,
    /// List active schemas.
    Schemas,
    Create {
        #[arg(long)]
        space: SpaceId,
        #[arg(long = "type")]
        entity_type: String,
        #[arg(long)]
        parent: Option<EntityId>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        /// JSON document.
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        user: Option<UserId>,
    },
    Get {
        id: EntityId,
    },
    List {
        #[arg(long)]
        space: Option<SpaceId>,
        #[arg(long = "type")]
        entity_types: Vec<String>,
        #[arg(long, conflicts_with = "root")]
        parent: Option<EntityId>,
        /// Only root-level entities.
        #[arg(long)]
        root: bool,
        #[arg(long)]
        status: Vec<EntityStatus>,
        #[arg(long)]
        created_by: Option<UserId>,
        /// `key=value`; the value is read as JSON when it parses, else as a string.
        #[arg(long)]
        content_eq: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long, default_value = "created_at")]
        order_by: OrderBy,
        #[arg(long, default_value = "desc")]
        direction: OrderDirection,
    },
    Update {
        id: EntityId,
        #[arg(long, conflicts_with = "clear_title")]
        title: Option<String>,
        #[arg(long)]
        clear_title: bool,
        #[arg(long, conflicts_with = "clear_summary")]
        summary: Option<String>,
        #[arg(long)]
        clear_summary: bool,
        #[arg(long, conflicts_with = "clear_content")]
        content: Option<String>,
        #[arg(long)]
        clear_content: bool,
        #[arg(long)]
        status: Option<EntityStatus>,
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Re-parent an entity; without `--parent` it moves to the space root.
    Move {
        id: EntityId,
        #[arg(long)]
        parent: Option<EntityId>,
        #[arg(long)]
        user: Option<UserId>,
    },
    Delete {
        id: EntityId,
        /// Remove the row instead of marking it deleted.
        #[arg(long)]
        hard: bool,
        #[arg(long)]
        user: Option<UserId>,
    },
    Restore {
        id: EntityId,
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Run a kanban move and a vote tally against the selected backend.
    Demo,
}

impl Command {
    /// False for commands that make sense against a store that lives only as long as the process.
    fn needs_persistence(&self) -> bool {
        !matches!(self, Command::Demo | Command::Schemas)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = StoreConfig::from_env().context("failed to load configuration")?;
    if let Some(backend) = &cli.backend {
        config.backend = backend.parse()?;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    if config.backend == Backend::Memory && cli.command.needs_persistence() {
        warn!(
            "using the in-memory backend: nothing is kept after this command exits; \
             pass --backend postgres or set TEAMSPACE_BACKEND=postgres"
        );
    }

    let store = bootstrap(&config)
        .await
        .context("failed to initialize the entity store")?;

    match cli.command {
        Command::Migrate => {
            let provisioned = store.schemas().provision_defaults().await?;
            print_json(&json!({ "provisioned": provisioned }))
        }
        Command::Schemas => print_json(&store.schemas().get_all_entity_schemas().await?),
        Command::Create {
            space,
            entity_type,
            parent,
            title,
            summary,
            content,
            user,
        } => {
            let mut input = CreateEntityInput::new(space, entity_type)
                .parent_id(parent)
                .created_by(user);
            input.title = title;
            input.summary = summary;
            input.content = content.as_deref().map(parse_json).transpose()?;
            print_json(&store.create_entity(input).await?)
        }
        Command::Get { id } => {
            let entity = store
                .get_entity_with_content::<JsonValue>(id)
                .await?
                .ok_or_else(|| anyhow!("entity {id} not found"))?;
            if let Err(err) = TypedContent::from_entity(&entity).and_then(|typed| match typed {
                Some(typed) => typed.validate(),
                None => Ok(()),
            }) {
                warn!(entity_id = %id, error = %err, "stored content does not satisfy its typed shape");
            }
            print_json(&entity)
        }
        Command::List {
            space,
            entity_types,
            parent,
            root,
            status,
            created_by,
            content_eq,
            limit,
            offset,
            order_by,
            direction,
        } => {
            let filters = list_filters(ListArgs {
                space,
                entity_types,
                parent,
                root,
                status,
                created_by,
                content_eq,
                limit,
                offset,
                order_by,
                direction,
            })?;
            print_json(&store.query_page(&filters).await?)
        }
        Command::Update {
            id,
            title,
            clear_title,
            summary,
            clear_summary,
            content,
            clear_content,
            status,
            user,
        } => {
            let mut input = UpdateEntityInput::new();
            if clear_title {
                input = input.clear_title();
            } else if let Some(title) = title {
                input = input.title(title);
            }
            if clear_summary {
                input = input.clear_summary();
            } else if let Some(summary) = summary {
                input = input.summary(summary);
            }
            if clear_content {
                input = input.clear_content();
            } else if let Some(content) = content {
                input = input.content(parse_json(&content)?);
            }
            input.status = status;
            print_json(&store.update_entity(id, input, user).await?)
        }
        Command::Move { id, parent, user } => {
            print_json(&store.move_entity(id, parent, user).await?)
        }
        Command::Delete { id, hard, user } => {
            let removed = if hard {
                store.permanently_delete_entity(id).await?
            } else {
                store.delete_entity(id, user).await?
            };
            print_json(&json!({ "id": id, "deleted": removed, "hard": hard }))
        }
        Command::Restore { id, user } => print_json(&store.restore_entity(id, user).await?),
        Command::Demo => run_demo(&store).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teamspace=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

struct ListArgs {
    space: Option<SpaceId>,
    entity_types: Vec<String>,
    parent: Option<EntityId>,
    root: bool,
    status: Vec<EntityStatus>,
    created_by: Option<UserId>,
    content_eq: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    order_by: OrderBy,
    direction: OrderDirection,
}

fn list_filters(args: ListArgs) -> Result<EntityFilters> {
    let mut filters = EntityFilters::new().order(args.order_by, args.direction);
    if let Some(space) = args.space {
        filters = filters.space(space);
    }
    match args.entity_types.len() {
        0 => {}
        1 => filters = filters.entity_type(args.entity_types[0].clone()),
        _ => filters = filters.entity_types(args.entity_types),
    }
    if args.root {
        filters = filters.parent(None);
    } else if let Some(parent) = args.parent {
        filters = filters.parent(Some(parent));
    }
    match args.status.len() {
        0 => {}
        1 => filters = filters.status(args.status[0]),
        _ => filters = filters.statuses(args.status),
    }
    if let Some(user) = args.created_by {
        filters = filters.created_by(user);
    }
    for pair in &args.content_eq {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("--content-eq expects key=value, got '{pair}'"))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()));
        filters = filters.content_eq(key, value);
    }
    if let Some(limit) = args.limit {
        filters = filters.limit(limit);
    }
    if let Some(offset) = args.offset {
        filters = filters.offset(offset);
    }
    Ok(filters)
}

fn parse_json(raw: &str) -> Result<JsonValue> {
    serde_json::from_str(raw).context("content must be a JSON document")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_demo(store: &EntityStore) -> Result<()> {
    let space = SpaceId::new_v4();
    let owner = UserId::new_v4();

    let project = projects::create_project(
        store,
        space,
        &Project {
            name: "Website relaunch".into(),
            ..Project::default()
        },
        Some(owner),
    )
    .await?;

    let mut lists = Vec::new();
    for (position, name) in ["Backlog", "Doing"].into_iter().enumerate() {
        let list = ProjectList {
            name: name.into(),
            project_id: project.id,
            position: position as i64,
            color: None,
        };
        lists.push(projects::create_list(store, space, &list, Some(owner)).await?);
    }

    let task = projects::create_task(
        store,
        space,
        &ProjectTask {
            title: "Write landing copy".into(),
            project_id: project.id,
            list_id: Some(lists[0].id),
            ..ProjectTask::default()
        },
        Some(owner),
    )
    .await?;
    let moved = projects::move_task(store, task.id, lists[1].id, 0, Some(owner)).await?;
    info!(task_id = %moved.id, list_id = %lists[1].id, "demo task moved");

    let vote = votes::create_vote(
        store,
        space,
        &Vote {
            title: "Launch day".into(),
            vote_options: vec!["Monday".into(), "Thursday".into()],
            is_anonymous: true,
            ..Vote::default()
        },
        Some(owner),
    )
    .await?;
    for choice_index in [0, 1, 1] {
        votes::submit_vote(store, vote.id, UserId::new_v4(), choice_index).await?;
    }
    let tally = votes::tally_votes(store, vote.id).await?;

    print_json(&json!({
        "space_id": space,
        "project_id": project.id,
        "task": {
            "id": moved.id,
            "parent_id": moved.parent_id,
            "list_id": moved.parsed_content.list_id,
        },
        "vote_id": vote.id,
        "tally": tally,
        "finished_at": Utc::now(),
    }))
}
