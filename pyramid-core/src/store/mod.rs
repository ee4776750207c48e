//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod filestore;
pub mod store;


pub use self::filestore::Filestore;
pub use self::store::Tilestore;
