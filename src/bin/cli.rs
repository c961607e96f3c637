use anyhow::Result;
use clap::{Parser, Subcommand};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use mindspace_rest_api::tables::{NoteStatus, TaskStatus};
use mindspace_rest_api::{api, client};
use std::net::SocketAddr;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// The address to bind to
        #[arg(short, long, default_value = "127.0.0.1:36170")]
        addr: SocketAddr,
    },
    /// Client commands
    Client {
        /// The base URL of the API
        #[arg(long, default_value = mindspace_rest_api::BASE_URL)]
        url: String,
        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Project related commands
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Note related commands
    Notes {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Task related commands
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show aggregate dashboard figures
    Dashboard,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a new project
    Create {
        /// Acting user id
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the user's projects
    List {
        /// Acting user id
        #[arg(long)]
        user: Uuid,
    },
    /// Fetch a single project
    Get { id: Uuid },
    /// Delete a project and everything under it
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a note in a project
    Create {
        #[arg(long)]
        project_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Move a note to another status column
    Move {
        id: Uuid,
        /// Destination column, e.g. "In Progress"
        #[arg(long)]
        status: NoteStatus,
    },
    /// Delete a note
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List a page of a project's tasks in board order
    List {
        #[arg(long)]
        project_id: Uuid,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Create a task under a note
    Create {
        #[arg(long)]
        note_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr } => {
            tracing_subscriber::fmt::init();

            // Set up database connection pool
            let database_url =
                std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env file");
            let manager = ConnectionManager::<PgConnection>::new(database_url);
            let pool = r2d2::Pool::builder()
                .build(manager)
                .expect("Failed to create pool");

            // Create router with connection pool
            let app = api::create_router(pool);

            tracing::info!("Starting server on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Commands::Client { url, command } => match command {
            ClientCommands::Projects { command } => match command {
                ProjectCommands::Create {
                    user,
                    title,
                    description,
                } => {
                    let project = client::create_project(
                        &url,
                        user,
                        client::CreateProjectRequest { title, description },
                    )
                    .await?;
                    println!("{}", serde_json::to_string_pretty(&project)?);
                }
                ProjectCommands::List { user } => {
                    let projects = client::fetch_projects(&url, user).await?;
                    println!("{}", serde_json::to_string_pretty(&projects)?);
                }
                ProjectCommands::Get { id } => match client::fetch_project(&url, id).await {
                    Ok(project) => {
                        println!("{}", serde_json::to_string_pretty(&project)?);
                    }
                    Err(client::ProjectError::NotFound(id)) => {
                        eprintln!("Error: Project {} not found", id);
                        std::process::exit(1);
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                ProjectCommands::Delete { id } => match client::delete_project(&url, id).await {
                    Ok(()) => println!("Project {} deleted", id),
                    Err(client::ProjectError::NotFound(id)) => {
                        eprintln!("Error: Project {} not found", id);
                        std::process::exit(1);
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
            },
            ClientCommands::Notes { command } => match command {
                NoteCommands::Create {
                    project_id,
                    title,
                    content,
                } => {
                    let note = client::create_note(
                        &url,
                        client::CreateNoteRequest {
                            project_id,
                            title,
                            content,
                            status: None,
                        },
                    )
                    .await?;
                    println!("{}", serde_json::to_string_pretty(&note)?);
                }
                NoteCommands::Move { id, status } => {
                    match client::move_note(&url, id, status).await {
                        Ok(note) => {
                            println!("{}", serde_json::to_string_pretty(&note)?);
                        }
                        Err(client::NoteError::NotFound(id)) => {
                            eprintln!("Error: Note {} not found", id);
                            std::process::exit(1);
                        }
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            std::process::exit(1);
                        }
                    }
                }
                NoteCommands::Delete { id } => match client::delete_note(&url, id).await {
                    Ok(()) => println!("Note {} deleted", id),
                    Err(client::NoteError::NotFound(id)) => {
                        eprintln!("Error: Note {} not found", id);
                        std::process::exit(1);
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
            },
            ClientCommands::Tasks { command } => match command {
                TaskCommands::List {
                    project_id,
                    page,
                    limit,
                } => {
                    let tasks = client::fetch_tasks(&url, project_id, page, limit).await?;
                    println!("{}", serde_json::to_string_pretty(&tasks)?);
                }
                TaskCommands::Create {
                    note_id,
                    title,
                    description,
                    status,
                } => {
                    let task = client::create_task(
                        &url,
                        client::CreateTaskRequest {
                            note_id,
                            title,
                            description,
                            status,
                        },
                    )
                    .await?;
                    println!("{}", serde_json::to_string_pretty(&task)?);
                }
                TaskCommands::Delete { id } => match client::delete_task(&url, id).await {
                    Ok(()) => println!("Task {} deleted", id),
                    Err(client::TaskError::NotFound(id)) => {
                        eprintln!("Error: Task {} not found", id);
                        std::process::exit(1);
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
            },
            ClientCommands::Dashboard => {
                let stats = client::fetch_dashboard(&url).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        },
    }

    Ok(())
}
