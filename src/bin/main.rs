//! Graphweave CLI - resolve GraphQL queries against a SQLite database
//!
//! Usage:
//!   graphweave resolve --schema <schema.graphql> --database <blog.db> --type <T> --table <t> --query <graphql>
//!   graphweave sql --schema <schema.graphql> --type <T> --table <t> --query <graphql> [--dialect <dialect>]
//!   graphweave token --name <name> [--rule <rule>]...
//!
//! Examples:
//!   graphweave resolve -s blog.graphql -d blog.db --type Post --table posts -q '{ posts { title } }'
//!   graphweave sql -s blog.graphql --type Post --table posts -q '{ post { title author { name } } }' --dialect postgres
//!   graphweave token --name ada --rule admin

use clap::{Args, Parser, Subcommand, ValueEnum};
use graphweave::auth::{Identity, TokenAuthority};
use graphweave::config::Settings;
use graphweave::executor::{Executor, SqliteExecutor};
use graphweave::resolver::{EntityQuery, ResolveContext, Resolver, ResolverOptions};
use graphweave::schema::SchemaIndex;
use graphweave::selection::document::{parse_operation, Variables};
use graphweave::selection::SelectionNode;
use graphweave::sql::Dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "graphweave")]
#[command(about = "Graphweave - declarative GraphQL to SQL resolution")]
#[command(version)]
struct Cli {
    /// Config file (defaults to GRAPHWEAVE_CONFIG, ./graphweave.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a query and print the result as JSON
    Resolve {
        #[command(flatten)]
        query: QueryArgs,

        /// SQLite database file (defaults to database.url)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Bearer token identifying the caller
        #[arg(long)]
        token: Option<String>,
    },

    /// Print the top-level SQL statement for a query without running it
    Sql {
        #[command(flatten)]
        query: QueryArgs,

        /// SQL dialect to generate (defaults to database.dialect)
        #[arg(long)]
        dialect: Option<DialectArg>,
    },

    /// Issue a signed token for an identity
    Token {
        #[arg(short, long)]
        name: String,

        /// Rules carried by the identity (repeatable)
        #[arg(short, long = "rule")]
        rules: Vec<String>,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Path to the GraphQL SDL with relation directives
    #[arg(short, long)]
    schema: PathBuf,

    /// Entity type of the root field
    #[arg(long = "type")]
    type_name: String,

    /// Table holding the entity rows
    #[arg(long)]
    table: String,

    /// GraphQL query text, or @path to read it from a file
    #[arg(short, long)]
    query: String,

    /// Operation to run when the document holds several
    #[arg(long)]
    operation: Option<String>,

    /// Variables as a JSON object
    #[arg(long)]
    variables: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Resolve {
            query,
            database,
            token,
        } => cmd_resolve(&settings, query, database, token).await,
        Commands::Sql { query, dialect } => cmd_sql(&settings, query, dialect),
        Commands::Token { name, rules } => cmd_token(&settings, name, rules),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    Ok(match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    })
}

/// Schema, root field and entity for a query command.
struct Prepared {
    schema: Arc<SchemaIndex>,
    field: SelectionNode,
    entity: EntityQuery,
}

fn prepare(args: &QueryArgs) -> CliResult<Prepared> {
    let sdl = read_file(&args.schema)?;
    let schema = SchemaIndex::from_sdl(&sdl)?;

    let source = match args.query.strip_prefix('@') {
        Some(path) => read_file(Path::new(path))?,
        None => args.query.clone(),
    };
    let variables: Variables = match &args.variables {
        Some(json) => serde_json::from_str(json)?,
        None => Variables::new(),
    };

    let fields = parse_operation(&source, args.operation.as_deref(), &variables)?;
    if fields.len() > 1 {
        log::warn!(
            "query selects {} root fields; resolving only `{}`",
            fields.len(),
            fields[0].name
        );
    }
    let field = fields
        .into_iter()
        .next()
        .ok_or("query selects no root field")?;

    Ok(Prepared {
        schema: Arc::new(schema),
        field,
        entity: EntityQuery::new(&args.type_name, &args.table),
    })
}

async fn cmd_resolve(
    settings: &Settings,
    args: QueryArgs,
    database: Option<PathBuf>,
    token: Option<String>,
) -> CliResult<()> {
    let prepared = prepare(&args)?;

    let path = match database {
        Some(path) => path,
        None => settings
            .database
            .resolved_url()?
            .map(PathBuf::from)
            .ok_or("no database given (use --database or database.url)")?,
    };
    let executor: Arc<dyn Executor> = Arc::new(SqliteExecutor::open(&path)?);

    let identity = match TokenAuthority::from_settings(&settings.auth) {
        Ok(authority) => authority.identity(token.as_deref()),
        Err(_) => {
            if token.is_some() {
                log::warn!("no auth secret configured; ignoring token");
            }
            settings.auth.guest_identity()
        }
    };

    let resolver = Resolver::with_options(
        prepared.schema,
        executor,
        ResolverOptions::from(settings),
    );
    let value = resolver
        .query(&prepared.entity, &prepared.field, &ResolveContext::new(identity))
        .await?;

    let mut data = serde_json::Map::new();
    data.insert(prepared.field.name.clone(), value.to_json());
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn cmd_sql(settings: &Settings, args: QueryArgs, dialect: Option<DialectArg>) -> CliResult<()> {
    let prepared = prepare(&args)?;
    let dialect = dialect.map(Dialect::from).unwrap_or(settings.database.dialect);

    let executor: Arc<dyn Executor> = Arc::new(SqliteExecutor::open_in_memory()?);
    let resolver = Resolver::with_options(
        prepared.schema,
        executor,
        ResolverOptions::from(settings),
    );
    let request = resolver.root_request(
        &prepared.entity,
        &prepared.field,
        &ResolveContext::new(settings.auth.guest_identity()),
    )?;
    let statement = resolver.statement(&request)?;

    println!("-- Graphweave SQL");
    println!("-- Root: {} ({})", prepared.field.name, request.cardinality);
    println!("-- Dialect: {:?}", dialect);
    println!();
    println!("{}", statement.to_sql(dialect));
    Ok(())
}

fn cmd_token(settings: &Settings, name: String, rules: Vec<String>) -> CliResult<()> {
    let authority = TokenAuthority::from_settings(&settings.auth)?;
    let token = authority.login(&Identity::new(&name, rules))?;
    println!("{}", token);
    Ok(())
}

fn read_file(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e).into())
}
