//! Interactive text menu driving the dataset preparations.

use crate::dataset::{
    DatasetManifest, export_column_layout, load_symbolic_network, prepare_reference_models,
};
use crate::retrieval::default_client;
use log::error;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_DATA_ROOT: &str = "data";
const DEFAULT_MANIFEST: &str = "dataset_manifest.json";

pub fn run_interactive_menu() {
    loop {
        show_main_menu();
        let choice = get_user_input("");

        match choice.trim() {
            "1" => prepare_dataset_menu(),
            "2" => export_menu(),
            "3" => inspect_menu(),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

fn show_main_menu() {
    println!(
        "\x1b[34m\n Welcome to crnprep: reaction network model preparation\n
    for discrete-event stochastic simulation \n \x1b[0m"
    );
    println!("\x1b[33m1. Fetch and convert the reference models\x1b[0m");
    println!("\x1b[33m2. Export a symbolic network to the column-vector layout\x1b[0m");
    println!("\x1b[33m3. Inspect a symbolic network\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    io::stdout().flush().unwrap();
}

fn prepare_dataset_menu() {
    let data_root = get_user_input(&format!("Data directory [{DEFAULT_DATA_ROOT}]: "));
    let data_root = non_empty_or(&data_root, DEFAULT_DATA_ROOT);
    let manifest =
        DatasetManifest::load_or_reference(Path::new(DEFAULT_MANIFEST), Path::new(&data_root));

    let client = match default_client() {
        Ok(client) => client,
        Err(err) => {
            error!("{err}");
            return;
        }
    };
    match prepare_reference_models(&client, &manifest) {
        Ok(()) => println!("Reference models are ready under {data_root}."),
        Err(err) => error!("failed to prepare the reference models: {err}"),
    }
}

fn export_menu() {
    let initial_state = get_user_input("Initial state file: ");
    let reactions = get_user_input("Reaction file: ");
    let out_dir = get_user_input("Output directory: ");
    match export_column_layout(
        Path::new(initial_state.trim()),
        Path::new(reactions.trim()),
        Path::new(out_dir.trim()),
    ) {
        Ok(()) => println!("Column-vector layout written to {}.", out_dir.trim()),
        Err(err) => error!("export failed: {err}"),
    }
}

fn inspect_menu() {
    let initial_state = get_user_input("Initial state file: ");
    let reactions = get_user_input("Reaction file: ");
    match load_symbolic_network(Path::new(initial_state.trim()), Path::new(reactions.trim())) {
        Ok(net) => net.pretty_print(),
        Err(err) => error!("failed to load the network: {err}"),
    }
}

fn get_user_input(prompt: &str) -> String {
    if !prompt.is_empty() {
        print!("\x1b[36m{prompt}\x1b[0m");
        io::stdout().flush().unwrap();
    }
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .expect("Failed to read input");
    input
}

fn non_empty_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
