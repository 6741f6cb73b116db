// Reading the influencer posts from a CSV file.

use std::io::Read;
use std::path::Path;

use pairwise_engine::{clean_resource, AssetRow, MetricRow};

use crate::survey::io_common::*;
use crate::survey::*;

/// Reads the posts file: one metric row and one asset row per post.
pub fn read_influencer_rows(
    root: &Path,
    source: &InfluencerSource,
) -> SurveyResult<(Vec<MetricRow>, Vec<AssetRow>)> {
    let path = resolve_path(root, &source.file_path).display().to_string();
    info!("Attempting to read influencer file {:?}", path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;
    read_influencer_records(rdr, source, &path)
}

/// Followers are parsed leniently: a value that does not read as a number is missing.
/// Posts without a category, a follower count or a caption are skipped.
pub fn read_influencer_records<R: Read>(
    mut rdr: csv::Reader<R>,
    source: &InfluencerSource,
    path: &str,
) -> SurveyResult<(Vec<MetricRow>, Vec<AssetRow>)> {
    let header: Vec<Option<String>> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| Some(s.to_string()))
        .collect();
    let cols = get_col_index_mapping(
        &[
            source.name_col(),
            source.category_col(),
            source.followers_col(),
            source.caption_col(),
            source.image_col(),
        ],
        &header,
        path,
    )?;
    let (name_idx, cat_idx, followers_idx, caption_idx, image_idx) =
        (cols[0], cols[1], cols[2], cols[3], cols[4]);
    let prefix = source.url_prefix();

    let mut metrics: Vec<MetricRow> = Vec::new();
    let mut assets: Vec<AssetRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let name = match non_empty(line.get(name_idx)) {
            Some(n) => n,
            None => {
                debug!("read_influencer_records: line {}: no name", lineno);
                continue;
            }
        };
        let category = non_empty(line.get(cat_idx));
        let followers = line.get(followers_idx).and_then(parse_number);
        let caption = non_empty(line.get(caption_idx));
        // A post missing any of these is dropped whole, image included.
        let (category, followers, caption) = match (category, followers, caption) {
            (Some(c), Some(f), Some(t)) => (c, f, t),
            x => {
                debug!(
                    "read_influencer_records: line {}: dropping post of {}: {:?}",
                    lineno, name, x
                );
                continue;
            }
        };
        let resource = line
            .get(image_idx)
            .and_then(clean_resource)
            .map(|f| format!("{}{}", prefix, f));
        metrics.push(MetricRow {
            name: name.clone(),
            metric: Some(followers),
            category: Some(category),
        });
        assets.push(AssetRow {
            name,
            resource,
            sub_category: None,
            caption: Some(caption),
        });
    }
    debug!(
        "read_influencer_records: {} posts read from {}",
        assets.len(),
        path
    );
    Ok((metrics, assets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> InfluencerSource {
        InfluencerSource {
            file_path: "posts.csv".to_string(),
            image_url_prefix: Some("https://cdn/".to_string()),
            name_column: None,
            category_column: None,
            followers_column: None,
            caption_column: None,
            image_column: None,
        }
    }

    fn read(data: &str) -> SurveyResult<(Vec<MetricRow>, Vec<AssetRow>)> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());
        read_influencer_records(rdr, &source(), "posts.csv")
    }

    #[test]
    fn posts() {
        let (metrics, assets) = read(
            "influencer_name,Category,Followers,caption,Image_file_name,likes\n\
             ann,Fashion,1200,hello,'a1.jpg',3\n\
             ann,Fashion,1200,again,\"a2.jpg\",4\n\
             ann,Fashion,1200,,a3.jpg,4\n\
             bob,,800,hi,b1.jpg,5\n\
             cid,Sport,many,hi,c1.jpg,5\n\
             ,Sport,10,x,c.jpg,6\n",
        )
        .unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].metric, Some(1200.0));
        assert_eq!(metrics[0].category.as_deref(), Some("Fashion"));
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].resource.as_deref(), Some("https://cdn/a1.jpg"));
        assert_eq!(assets[0].caption.as_deref(), Some("hello"));
        assert_eq!(assets[1].resource.as_deref(), Some("https://cdn/a2.jpg"));
    }

    #[test]
    fn incomplete_posts_stay_out_of_the_display_pool() {
        let (metrics, assets) = read(
            "influencer_name,Category,Followers,caption,Image_file_name\n\
             ann,Fashion,1200,first,ok.jpg\n\
             ann,,,second,bad_row.jpg\n\
             bea,Fashion,900,third,bea.jpg\n\
             cy,Food,300,fourth,cy.jpg\n",
        )
        .unwrap();
        let (catalog, report) = CatalogBuilder::new(Variant::Influencers)
            .extend_metrics(metrics)
            .extend_assets(assets)
            .build();
        assert_eq!(report.dropped_asset_rows, 0);
        let pool: Vec<&str> = catalog
            .assets_of("ann")
            .unwrap()
            .iter()
            .map(|a| a.resource.as_str())
            .collect();
        assert_eq!(pool, vec!["https://cdn/ok.jpg"]);
        assert_eq!(catalog.metric_of("ann"), Some(1200.0));
    }

    #[test]
    fn missing_column() {
        assert!(read("influencer_name,Category,Followers\nann,Fashion,1\n").is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_influencer_rows(dir.path(), &source()).is_err());
    }
}
