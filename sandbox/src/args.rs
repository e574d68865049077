// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sandbox")]
#[command(version, about = "Preloads asset groups and reports the outcome")]
pub struct Args {
    /// The registry declaring the asset groups.
    #[arg(long, env = "SPOOL_REGISTRY", default_value = "sandbox/assets/registry.ron")]
    pub registry: PathBuf,

    /// A RON configuration file. Defaults apply when omitted.
    #[arg(long, env = "SPOOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// The directory assets are read from.
    #[arg(long, env = "SPOOL_ASSET_ROOT", default_value = "sandbox/assets", conflicts_with = "base_url")]
    pub root: PathBuf,

    /// Fetch assets over HTTP from this base URL instead of the filesystem.
    #[arg(long, env = "SPOOL_BASE_URL")]
    pub base_url: Option<String>,

    /// Extra groups to preload once the preloader is initialized.
    #[arg(long = "group", value_name = "NAME")]
    pub groups: Vec<String>,

    /// Wait for the background group before exiting.
    #[arg(long)]
    pub wait_background: bool,
}
