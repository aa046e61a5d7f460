// PowerShell scripts run by the adapters
//
// Each script reads one JSON request from stdin and writes exactly one JSON
// envelope line to stdout: {"result": ...} or {"error": {"kind", "message"}}.
// Error kinds: not_found, unavailable, transport, access_denied, failed.

/// Local directory query.
///
/// Request: `{"name": "<exact name>" | null, "domain": "<dns name>" | null}`.
/// Result: array of raw records (Get-GPO property names).
pub const LOCAL_QUERY: &str = r#"
$ErrorActionPreference = 'Stop'
function Write-Envelope($value) { Write-Output (ConvertTo-Json -InputObject $value -Depth 6 -Compress) }
function Format-Time($t) { if ($t) { $t.ToUniversalTime().ToString('o') } else { $null } }

try {
    $request = [Console]::In.ReadToEnd() | ConvertFrom-Json
    try {
        Import-Module GroupPolicy -ErrorAction Stop
    } catch {
        Write-Envelope @{ error = @{ kind = 'unavailable'; message = $_.Exception.Message } }
        exit 0
    }

    $params = @{}
    if ($request.domain) { $params.Domain = $request.domain }

    if ($request.name) {
        $gpos = @(Get-GPO -Name $request.name @params)
    } else {
        $gpos = @(Get-GPO -All @params)
    }

    $records = @($gpos | ForEach-Object {
        @{
            DisplayName      = $_.DisplayName
            Id               = "$($_.Id)"
            DomainName       = $_.DomainName
            CreationTime     = Format-Time $_.CreationTime
            ModificationTime = Format-Time $_.ModificationTime
            Owner            = $_.Owner
            Description      = $_.Description
            GpoStatus        = "$($_.GpoStatus)"
        }
    })
    Write-Envelope @{ result = $records }
} catch [System.ArgumentException] {
    Write-Envelope @{ error = @{ kind = 'not_found'; message = $_.Exception.Message } }
} catch [System.DirectoryServices.ActiveDirectory.ActiveDirectoryServerDownException] {
    Write-Envelope @{ error = @{ kind = 'unavailable'; message = $_.Exception.Message } }
} catch {
    Write-Envelope @{ error = @{ kind = 'failed'; message = $_.Exception.Message } }
}
"#;

/// Remote query through PowerShell remoting.
///
/// Request: `{"host", "credential": {"username","password"} | null,
/// "query": RemoteQueryRequest}`. The query travels as data (`-ArgumentList`);
/// the script block below is fixed and executes the selector plan the caller
/// already classified. Result: `{"records": [flat], "errors": [selector errors]}`.
pub const REMOTE_QUERY: &str = r#"
$ErrorActionPreference = 'Stop'
function Write-Envelope($value) { Write-Output (ConvertTo-Json -InputObject $value -Depth 8 -Compress) }

$remoteBlock = {
    param($queryJson)
    $ErrorActionPreference = 'Stop'
    $query = $queryJson | ConvertFrom-Json
    Import-Module GroupPolicy -ErrorAction Stop

    $params = @{}
    if ($query.domain) { $params.Domain = $query.domain }

    $records = New-Object System.Collections.ArrayList
    $errors = New-Object System.Collections.ArrayList
    $seen = @{}

    function Format-Time($t) { if ($t) { $t.ToUniversalTime().ToString('o') } else { $null } }
    function Add-Gpo($gpo) {
        $key = "$($gpo.Id)"
        if ($seen.ContainsKey($key)) { return }
        $seen[$key] = $true
        [void]$records.Add(@{
            displayName  = $gpo.DisplayName
            id           = $key
            domain       = $gpo.DomainName
            created      = Format-Time $gpo.CreationTime
            modified     = Format-Time $gpo.ModificationTime
            owner        = $gpo.Owner
            description  = $gpo.Description
            statusMarker = "$($gpo.GpoStatus)"
        })
    }

    switch ($query.plan.kind) {
        'all' {
            try {
                Get-GPO -All @params | ForEach-Object { Add-Gpo $_ }
            } catch {
                [void]$errors.Add(@{ selector = '*'; kind = 'failed'; message = $_.Exception.Message })
            }
        }
        'exact' {
            foreach ($name in $query.plan.selectors) {
                try {
                    Get-GPO -Name $name @params | ForEach-Object { Add-Gpo $_ }
                } catch [System.ArgumentException] {
                    [void]$errors.Add(@{ selector = $name; kind = 'not_found'; message = "GPO not found: $name" })
                } catch {
                    [void]$errors.Add(@{ selector = $name; kind = 'failed'; message = $_.Exception.Message })
                }
            }
        }
        'wildcard' {
            try {
                $all = @(Get-GPO -All @params)
                foreach ($pattern in $query.plan.selectors) {
                    # Only * and ? are wildcards; brackets and backticks match literally
                    $escaped = $pattern -replace '([\[\]`])', '`$1'
                    $all | Where-Object { $_.DisplayName -like $escaped } | ForEach-Object { Add-Gpo $_ }
                }
            } catch {
                foreach ($pattern in $query.plan.selectors) {
                    [void]$errors.Add(@{ selector = $pattern; kind = 'failed'; message = $_.Exception.Message })
                }
            }
        }
    }

    ConvertTo-Json -InputObject @{ records = @($records); errors = @($errors) } -Depth 6 -Compress
}

try {
    $request = [Console]::In.ReadToEnd() | ConvertFrom-Json
    $invoke = @{
        ComputerName = $request.host
        ScriptBlock  = $remoteBlock
        ArgumentList = @(ConvertTo-Json -InputObject $request.query -Depth 6 -Compress)
        ErrorAction  = 'Stop'
    }
    if ($request.credential) {
        $secure = ConvertTo-SecureString $request.credential.password -AsPlainText -Force
        $invoke.Credential = New-Object System.Management.Automation.PSCredential($request.credential.username, $secure)
    }

    $responseJson = Invoke-Command @invoke
    Write-Envelope @{ result = ($responseJson | ConvertFrom-Json) }
} catch [System.Management.Automation.Remoting.PSRemotingTransportException] {
    $kind = 'transport'
    if ($_.Exception.ErrorCode -eq 5 -or $_.Exception.Message -match 'Access is denied') { $kind = 'access_denied' }
    Write-Envelope @{ error = @{ kind = $kind; message = $_.Exception.Message } }
} catch [System.UnauthorizedAccessException] {
    Write-Envelope @{ error = @{ kind = 'access_denied'; message = $_.Exception.Message } }
} catch {
    Write-Envelope @{ error = @{ kind = 'failed'; message = $_.Exception.Message } }
}
"#;
