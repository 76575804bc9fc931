mod m0001_seo_data;
mod m0002_site_content;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_seo_data::migration());
    reg.register(m0002_site_content::migration());
    reg
}
