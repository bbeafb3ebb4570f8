//! StudentLedger CLI Client
//!
//! Command-line interface for interacting with a StudentLedger server.

use clap::{Args as ClapArgs, Parser, Subcommand};
use studentledger::network::Client;
use studentledger::protocol::OperationKind;

/// StudentLedger CLI
#[derive(Parser, Debug)]
#[command(name = "studentledger-cli")]
#[command(about = "CLI for the StudentLedger record service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7051")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

/// The seven fields of a student record
#[derive(ClapArgs, Debug)]
struct StudentFields {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    mobile: String,
    address: String,
    city: String,
}

impl StudentFields {
    fn into_args(self) -> Vec<String> {
        vec![
            self.id,
            self.first_name,
            self.last_name,
            self.email,
            self.mobile,
            self.address,
            self.city,
        ]
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a student record
    Create(StudentFields),

    /// Update an existing student record
    Update(StudentFields),

    /// Read one student record
    Read {
        /// Student id
        id: String,
    },

    /// List every record
    ReadAll,

    /// Delete a student record
    Delete {
        /// Student id
        id: String,
    },

    /// Show the version history of a record
    History {
        /// Student id
        id: String,
    },
}

impl Commands {
    fn into_invocation(self) -> (OperationKind, Vec<String>) {
        match self {
            Commands::Create(fields) => (OperationKind::CreateStudent, fields.into_args()),
            Commands::Update(fields) => (OperationKind::UpdateStudent, fields.into_args()),
            Commands::Read { id } => (OperationKind::ReadStudent, vec![id]),
            Commands::ReadAll => (OperationKind::ReadAllStudents, Vec::new()),
            Commands::Delete { id } => (OperationKind::DeleteStudent, vec![id]),
            Commands::History { id } => (OperationKind::GetHistoryForStudent, vec![id]),
        }
    }
}

fn main() {
    let args = Args::parse();
    let (kind, call_args) = args.command.into_invocation();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match client.invoke(kind.name(), call_args) {
        Ok(response) if response.is_ok() => {
            let body = response.payload_str();
            if body.is_empty() {
                println!("OK");
            } else {
                println!("{}", body);
            }
        }
        Ok(response) => {
            eprintln!("Error: {}", response.payload_str());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
