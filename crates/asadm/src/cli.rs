//! Clap derive structures for the `asadm` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use asadm_core::{AuthMethod, BulkAction, IpAssignMode, Role, SortField, SortOrder};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// asadm -- administer OpenVPN Access Server users, groups and sessions
#[derive(Debug, Parser)]
#[command(
    name = "asadm",
    version,
    about = "Administer OpenVPN Access Server from the command line",
    long_about = "Manage VPN users, groups and live sessions on an OpenVPN Access Server\n\
        appliance through its XML-RPC administration endpoint.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "ASADM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance host (overrides profile)
    #[arg(long, short = 'H', env = "ASADM_HOST", global = true)]
    pub host: Option<String>,

    /// Administration port (overrides profile)
    #[arg(long, env = "ASADM_PORT", global = true)]
    pub port: Option<u16>,

    /// Administrative username (overrides profile)
    #[arg(long, short = 'u', env = "ASADM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ASADM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ASADM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ASADM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage VPN users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage user groups
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// View connected sessions
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Disconnect one or more users
    Disconnect {
        /// Usernames to disconnect
        #[arg(required = true)]
        usernames: Vec<String>,

        /// Message shown to the disconnected clients
        #[arg(long, short = 'm')]
        message: Option<String>,
    },

    /// Appliance information and service control
    #[command(alias = "srv")]
    Server(ServerArgs),

    /// Apply one action to many users or groups
    Bulk(BulkArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number (starting at 1)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Results per page
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users with optional filters
    #[command(alias = "ls")]
    List(UserListArgs),

    /// Show one user
    Get {
        username: String,
    },

    /// Create a user
    Create(UserCreateArgs),

    /// Change fields of an existing user
    Update(UserUpdateArgs),

    /// Delete a user
    #[command(alias = "rm")]
    Delete {
        username: String,
    },

    /// Allow a user to connect
    Enable {
        username: String,
    },

    /// Deny a user from connecting
    Disable {
        username: String,
    },

    /// Set a local user's password
    Password {
        username: String,

        /// New password (prompted when omitted)
        #[arg(long, env = "ASADM_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Regenerate a user's TOTP secret
    Totp {
        username: String,
    },

    /// Report users whose expiration falls within a window
    Expiring {
        /// Window in days on either side of today (0-365)
        #[arg(long, short = 'd', default_value = "30")]
        days: i64,

        /// Print only the email addresses of users not yet expired
        #[arg(long)]
        emails: bool,
    },
}

#[derive(Debug, Args)]
pub struct UserListArgs {
    /// Match on username
    #[arg(long)]
    pub username: Option<String>,

    /// Match on email
    #[arg(long)]
    pub email: Option<String>,

    /// Require exact username/email matches instead of substrings
    #[arg(long)]
    pub exact: bool,

    /// Compare usernames and emails case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    #[arg(long)]
    pub auth: Option<AuthMethod>,

    #[arg(long)]
    pub role: Option<Role>,

    /// Exact group name
    #[arg(long)]
    pub group: Option<String>,

    #[arg(long)]
    pub enabled: Option<bool>,

    #[arg(long)]
    pub deny: Option<bool>,

    #[arg(long)]
    pub mfa: Option<bool>,

    /// Expiration on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub expires_after: Option<NaiveDate>,

    /// Expiration on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub expires_before: Option<NaiveDate>,

    /// Include users whose expiration has passed
    #[arg(long)]
    pub include_expired: Option<bool>,

    /// Expiring within this many days from today
    #[arg(long)]
    pub expiring_in: Option<i64>,

    #[arg(long)]
    pub has_access_control: Option<bool>,

    /// MAC address (substring, or exact with --exact)
    #[arg(long)]
    pub mac: Option<String>,

    /// Static IP address (substring, or exact with --exact)
    #[arg(long)]
    pub ip: Option<String>,

    /// Free text matched against username, email and group
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort field: username, email, authMethod, role, groupName, userExpiration
    #[arg(long, default_value = "username")]
    pub sort: SortField,

    #[arg(long, default_value = "asc")]
    pub order: SortOrder,

    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Debug, Args)]
pub struct UserCreateArgs {
    pub username: String,

    #[arg(long, short = 'e', default_value = "")]
    pub email: String,

    #[arg(long, default_value = "local")]
    pub auth: AuthMethod,

    /// Group to place the user in (default group when omitted)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Password for local users (prompted when omitted)
    #[arg(long, env = "ASADM_NEW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Expiration date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long)]
    pub expiration: Option<String>,

    /// Bound client MAC address (repeatable, up to five)
    #[arg(long = "mac")]
    pub macs: Vec<String>,

    /// Access-control entry, CIDR or bare IP (repeatable)
    #[arg(long = "access")]
    pub access: Vec<String>,

    /// Static VPN address
    #[arg(long)]
    pub ip: Option<String>,

    #[arg(long)]
    pub ip_mode: Option<IpAssignMode>,
}

#[derive(Debug, Args)]
pub struct UserUpdateArgs {
    pub username: String,

    #[arg(long)]
    pub expiration: Option<String>,

    #[arg(long)]
    pub deny: Option<bool>,

    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Replace the bound MAC addresses (repeatable)
    #[arg(long = "mac")]
    pub macs: Option<Vec<String>>,

    /// Remove every bound MAC address
    #[arg(long, conflicts_with = "macs")]
    pub clear_macs: bool,

    /// Replace the access-control entries (repeatable)
    #[arg(long = "access")]
    pub access: Option<Vec<String>>,

    /// Remove every access-control entry
    #[arg(long, conflicts_with = "access")]
    pub clear_access: bool,

    /// Static VPN address (implies --ip-mode static)
    #[arg(long)]
    pub ip: Option<String>,

    #[arg(long)]
    pub ip_mode: Option<IpAssignMode>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List groups
    #[command(alias = "ls")]
    List {
        /// Name substring (case-insensitive)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        auth: Option<AuthMethod>,

        #[arg(long)]
        role: Option<Role>,

        #[arg(long)]
        enabled: Option<bool>,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show one group
    Get {
        name: String,
    },

    /// Create a group
    Create(GroupCreateArgs),

    /// Change fields of an existing group
    Update(GroupUpdateArgs),

    /// Delete a group
    #[command(alias = "rm")]
    Delete {
        name: String,
    },

    /// Allow the group's members to connect
    Enable {
        name: String,
    },

    /// Deny the group's members from connecting
    Disable {
        name: String,
    },

    /// Remove every access-control entry from a group
    ClearAccess {
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct GroupCreateArgs {
    pub name: String,

    #[arg(long, default_value = "local")]
    pub auth: AuthMethod,

    #[arg(long, default_value = "User")]
    pub role: Role,

    /// Require TOTP for members
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    pub mfa: bool,

    /// Access-control entry (repeatable)
    #[arg(long = "access")]
    pub access: Vec<String>,

    /// Group subnet in CIDR form (repeatable)
    #[arg(long = "subnet")]
    pub subnets: Vec<String>,

    /// Dynamic range "start-end" inside a group subnet (repeatable)
    #[arg(long = "range")]
    pub ranges: Vec<String>,
}

#[derive(Debug, Args)]
pub struct GroupUpdateArgs {
    pub name: String,

    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long)]
    pub mfa: Option<bool>,

    #[arg(long)]
    pub deny: Option<bool>,

    /// Replace the access-control entries (repeatable)
    #[arg(long = "access")]
    pub access: Option<Vec<String>>,

    /// Replace the group subnets (repeatable)
    #[arg(long = "subnet")]
    pub subnets: Option<Vec<String>>,

    /// Replace the dynamic ranges (repeatable)
    #[arg(long = "range")]
    pub ranges: Option<Vec<String>>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS / SERVER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(subcommand)]
    pub command: StatusCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatusCommand {
    /// List connected sessions
    #[command(alias = "ls")]
    List,

    /// Session count and the sessions themselves
    Summary,

    /// Exit 0 when the user has a live session, 4 otherwise
    Check {
        username: String,
    },
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[command(subcommand)]
    pub command: ServerCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Node and listener information
    Info,

    /// VPN network settings
    Network,

    /// Warm-restart the VPN services
    Restart,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BULK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BulkArgs {
    /// Items processed at once
    #[arg(long, short = 'c', default_value = "5", global = true)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub command: BulkCommand,
}

#[derive(Debug, Subcommand)]
pub enum BulkCommand {
    /// Create users from a JSON array file
    CreateUsers {
        #[arg(long = "from-file", short = 'F')]
        file: PathBuf,
    },

    /// Create groups from a JSON array file
    CreateGroups {
        #[arg(long = "from-file", short = 'F')]
        file: PathBuf,
    },

    /// Delete, enable, disable or reset-otp for many users
    Users {
        /// delete, enable, disable or reset-otp
        action: BulkAction,

        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Delete, enable or disable many groups
    Groups {
        /// delete, enable or disable
        action: BulkAction,

        #[arg(required = true)]
        names: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a profile value
    Set {
        /// host, port, username, password_env, ca_cert, insecure or timeout
        key: String,

        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        name: String,
    },

    /// Store a profile password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
