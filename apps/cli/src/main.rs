// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Envelope CLI - commands for editing building envelope models.
//!
//! Every command reads a model JSON file, applies one editing operation
//! across the model's rooms, and writes the edited model JSON to a file or
//! stdout. Distance and angle flags are plain numbers in the model's units
//! and degrees respectively. Exits 0 on success, 1 on any error.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "envelope", version, about = "Commands for editing building envelope models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add apertures to all outdoor walls of a model given a ratio
    WindowsByRatio {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Ratio between aperture area and wall area, in [0, 1)
        ratio: f64,
        /// Optional file for the edited model JSON; stdout when omitted
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Add customizable rectangular apertures to all outdoor walls
    WindowsByRatioRect {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Ratio between aperture area and wall area, in [0, 0.95]
        ratio: f64,
        /// Target height of the output apertures
        #[arg(short = 'a', long, default_value_t = 2.0)]
        aperture_height: f64,
        /// Target height above the wall bottom at which apertures start
        #[arg(short = 's', long, default_value_t = 0.8)]
        sill_height: f64,
        /// Target separation between aperture center lines
        #[arg(short = 'x', long, default_value_t = 3.0)]
        horizontal_separation: f64,
        /// Optional vertical separation between top and bottom apertures
        #[arg(short = 'y', long, default_value_t = 0.0)]
        vertical_separation: f64,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Add overhangs to all outdoor walls or windows in walls
    Overhang {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Overhang depth
        #[arg(short = 'd', long, default_value_t = 1.0)]
        depth: f64,
        /// Angle in degrees; positive rotates downward
        #[arg(short = 'a', long, default_value_t = 0.0)]
        angle: f64,
        /// Vertical offset of the overhang; positive moves up
        #[arg(short = 'o', long, default_value_t = 0.0)]
        vertical_offset: f64,
        /// Generate one overhang per aperture instead of per wall
        #[arg(long)]
        per_window: bool,
        /// Generate the overhangs facing the indoors, like a light shelf
        #[arg(short = 'i', long)]
        indoor: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Add a fixed number of louvers to all outdoor walls or windows
    LouversByCount {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Number of louvers to generate
        louver_count: usize,
        /// Louver depth
        #[arg(short = 'd', long, default_value_t = 0.25)]
        depth: f64,
        /// Angle in degrees; positive rotates downward
        #[arg(short = 'a', long, default_value_t = 0.0)]
        angle: f64,
        /// Offset of the louvers from the base face
        #[arg(short = 'o', long, default_value_t = 0.0)]
        offset: f64,
        /// Generate vertical louvers instead of horizontal ones
        #[arg(short = 'v', long)]
        vertical: bool,
        /// Generate louvers per aperture instead of per wall
        #[arg(long)]
        per_window: bool,
        /// Generate the louvers facing the indoors
        #[arg(short = 'i', long)]
        indoor: bool,
        /// Start louvers from the bottom or left instead of top or right
        #[arg(long)]
        flip_start: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Add louvers at a fixed spacing to all outdoor walls or windows
    LouversBySpacing {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Distance between louvers
        #[arg(short = 's', long, default_value_t = 0.5)]
        spacing: f64,
        /// Louver depth
        #[arg(short = 'd', long, default_value_t = 0.25)]
        depth: f64,
        /// Angle in degrees; positive rotates downward
        #[arg(short = 'a', long, default_value_t = 0.0)]
        angle: f64,
        /// Offset of the louvers from the base face
        #[arg(short = 'o', long, default_value_t = 0.0)]
        offset: f64,
        /// Generate vertical louvers instead of horizontal ones
        #[arg(short = 'v', long)]
        vertical: bool,
        /// Maximum number of louvers to generate; 0 covers the whole face
        #[arg(short = 'm', long, default_value_t = 0)]
        max_count: usize,
        /// Generate louvers per aperture instead of per wall
        #[arg(long)]
        per_window: bool,
        /// Generate the louvers facing the indoors
        #[arg(short = 'i', long)]
        indoor: bool,
        /// Start louvers from the bottom or left instead of top or right
        #[arg(long)]
        flip_start: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Add extruded borders to all windows in outdoor walls
    ExtrudedBorder {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Extrusion depth
        #[arg(short = 'd', long, default_value_t = 0.2)]
        depth: f64,
        /// Extrude the borders toward the indoors
        #[arg(short = 'i', long)]
        indoor: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Solve surface adjacency between the rooms of a model
    SolveAdjacency {
        /// Path to a model JSON file
        model_file: PathBuf,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Convert a model to a given unit system
    ConvertUnits {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Target units: Meters, Millimeters, Feet, Inches or Centimeters
        units: String,
        /// Change the units tag without scaling the geometry
        #[arg(short = 'n', long)]
        no_scale: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Repair sub-faces that spill past their parent or overlap each other
    FixSubFaces {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Clearance kept between repaired sub-faces and the face boundary
        #[arg(short = 'o', long, default_value_t = 0.05)]
        offset_distance: f64,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
    /// Convert all non-rectangular apertures to rectangles
    Rectangularize {
        /// Path to a model JSON file
        model_file: PathBuf,
        /// Resolution for subdividing apertures into bounded rectangles;
        /// omitted, each aperture snaps to its bounding rectangle
        #[arg(short = 's', long)]
        subdivision_distance: Option<f64>,
        /// Distance across which nearby apertures merge before conversion
        #[arg(short = 'm', long)]
        max_separation: Option<f64>,
        /// Merge all apertures, not just the non-rectangular ones
        #[arg(long)]
        merge_all: bool,
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::WindowsByRatio {
            model_file,
            ratio,
            output_file,
        } => commands::windows_by_ratio(&model_file, ratio, output_file.as_deref()),
        Command::WindowsByRatioRect {
            model_file,
            ratio,
            aperture_height,
            sill_height,
            horizontal_separation,
            vertical_separation,
            output_file,
        } => commands::windows_by_ratio_rect(
            &model_file,
            ratio,
            aperture_height,
            sill_height,
            horizontal_separation,
            vertical_separation,
            output_file.as_deref(),
        ),
        Command::Overhang {
            model_file,
            depth,
            angle,
            vertical_offset,
            per_window,
            indoor,
            output_file,
        } => commands::overhang(
            &model_file,
            depth,
            angle.to_radians(),
            vertical_offset,
            per_window,
            indoor,
            output_file.as_deref(),
        ),
        Command::LouversByCount {
            model_file,
            louver_count,
            depth,
            angle,
            offset,
            vertical,
            per_window,
            indoor,
            flip_start,
            output_file,
        } => commands::louvers_by_count(
            &model_file,
            louver_count,
            depth,
            angle.to_radians(),
            offset,
            vertical,
            per_window,
            indoor,
            flip_start,
            output_file.as_deref(),
        ),
        Command::LouversBySpacing {
            model_file,
            spacing,
            depth,
            angle,
            offset,
            vertical,
            max_count,
            per_window,
            indoor,
            flip_start,
            output_file,
        } => commands::louvers_by_spacing(
            &model_file,
            spacing,
            depth,
            angle.to_radians(),
            offset,
            vertical,
            (max_count > 0).then_some(max_count),
            per_window,
            indoor,
            flip_start,
            output_file.as_deref(),
        ),
        Command::ExtrudedBorder {
            model_file,
            depth,
            indoor,
            output_file,
        } => commands::extruded_border(&model_file, depth, indoor, output_file.as_deref()),
        Command::SolveAdjacency {
            model_file,
            output_file,
        } => commands::solve_adjacency(&model_file, output_file.as_deref()),
        Command::ConvertUnits {
            model_file,
            units,
            no_scale,
            output_file,
        } => commands::convert_units(&model_file, &units, no_scale, output_file.as_deref()),
        Command::FixSubFaces {
            model_file,
            offset_distance,
            output_file,
        } => commands::fix_sub_faces(&model_file, offset_distance, output_file.as_deref()),
        Command::Rectangularize {
            model_file,
            subdivision_distance,
            max_separation,
            merge_all,
            output_file,
        } => commands::rectangularize(
            &model_file,
            subdivision_distance,
            max_separation,
            merge_all,
            output_file.as_deref(),
        ),
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
