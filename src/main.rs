use clap::Parser;
use miette::Result;
use stockwise::cli::commands::{completions, init, kinds, records, uom};
use stockwise::cli::helpers::load_config;
use stockwise::cli::{Cli, Commands};
use stockwise::core::logging;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping to
    // `head` or `grep -q` does not panic on a broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let config = load_config(&global);
    let directive = if global.verbose {
        Some("stockwise=debug")
    } else {
        config.log.as_deref()
    };
    logging::init(directive);

    match cli.command {
        Commands::Init(args) => init::run(args, &global),
        Commands::Kinds => kinds::run(&global),
        Commands::List(args) => records::run_list(args, &global),
        Commands::Get(args) => records::run_get(args, &global),
        Commands::Create(args) => records::run_create(args, &global),
        Commands::Update(args) => records::run_update(args, &global),
        Commands::Delete(args) => records::run_delete(args, &global),
        Commands::Uom(cmd) => uom::run(cmd, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
