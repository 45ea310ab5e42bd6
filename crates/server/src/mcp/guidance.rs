//! Static guidance exposed as an MCP resource and prompt.

pub const GUIDELINES_URI: &str = "jgrants://guidelines";
pub const GUIDELINES_NAME: &str = "jgrants_guidelines";
pub const SEARCH_GUIDE_PROMPT: &str = "subsidy_search_guide";

pub const GUIDELINES: &str = r#"# jGrants tool guidelines

jGrants is the Digital Agency's subsidy e-application system. These tools wrap its public API.

## Tools

- `search_subsidies`: keyword search. `keyword` is required (2 to 255 characters).
  - `sort`: `created_date`, `acceptance_start_datetime` or `acceptance_end_datetime` (default).
  - `order`: `ASC` (default) or `DESC`.
  - `acceptance`: `1` (default) for subsidies currently accepting applications, `0` for all.
  - Optional filters: `use_purpose`, `industry`, `target_number_of_employees`,
    `target_area_search`.
- `get_subsidy_detail`: full record for one `subsidy_id` taken from search results.
- `get_subsidy_overview`: counts of open subsidies by deadline and by maximum amount.
  `output_format` is `json` (default) or `csv`.
- `get_file_content`: attachment conversion is not available yet.
- `ping`: connectivity check.

## Tips

- Keywords are matched against titles and descriptions; short Japanese terms such as
  `IT導入`, `省エネ` or `事業承継` work best.
- Sort by `acceptance_end_datetime` ascending to surface deadlines that are coming up.
- Failures come back as `{"error": "..."}`; fix the argument named in the message and retry.
"#;

pub const SEARCH_GUIDE_DESCRIPTION: &str =
    "Step-by-step guide for finding subsidies that match a business";

pub const SEARCH_GUIDE: &str = r"Help me find subsidies on jGrants.

1. Ask which industry, region and number of employees the business has, and what the money is
   for (equipment, IT, hiring, energy saving, business succession, ...).
2. Call `search_subsidies` with a short keyword for that purpose. Add `industry`,
   `target_area_search` and `target_number_of_employees` when known. Keep `acceptance` at 1 to
   see only subsidies that are open now.
3. Present the best matches with their title, maximum amount and application deadline.
4. For any subsidy I am interested in, call `get_subsidy_detail` with its `id` and summarize
   eligibility, subsidy rate and required documents.
5. If nothing matches, broaden the keyword or drop filters and search again.";
